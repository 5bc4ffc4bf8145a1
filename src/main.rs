use clap::{Arg, ArgAction, Command};
use log::info;
use std::path::PathBuf;

use wordplug::{dependencies, pipeline};
use wordplug::{BeepMix, Config, ConfigBuilder, ConfigFile, Engine, PadSpec, ProgressOperation, Result};

fn build_cli() -> Command {
    Command::new("wordplug")
        .about("Censors profanity in audio and video files by muting or beeping words located with speech recognition")
        .version("0.1.0")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Input audio or video file to process")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file (defaults to input_clean.ext)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output audio format (default: inferred from output/input, \"MATCH\")"),
        )
        .arg(
            Arg::new("engine")
                .short('e')
                .long("engine")
                .value_name("ENGINE")
                .help("Speech recognition engine")
                .default_value("whisper")
                .value_parser(["whisper", "vosk"]),
        )
        .arg(
            Arg::new("swears")
                .short('w')
                .long("swears")
                .value_name("FILE")
                .help("Profanity file (one word or word|replacement per line, or JSON array)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("transcript")
                .short('t')
                .long("transcript")
                .value_name("FILE")
                .help("Use an existing transcript JSON instead of running recognition")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("save-transcript")
                .long("save-transcript")
                .value_name("FILE")
                .help("Save/reuse the transcript JSON at this path")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("force-retranscribe")
                .long("force-retranscribe")
                .help("Re-run recognition even when a saved transcript exists")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pad-milliseconds")
                .short('p')
                .long("pad-milliseconds")
                .value_name("MS")
                .help("Milliseconds to pad on either side of censored spans")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("pad-milliseconds-pre")
                .long("pad-milliseconds-pre")
                .value_name("MS")
                .help("Milliseconds to pad before censored spans (overrides --pad-milliseconds)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("pad-milliseconds-post")
                .long("pad-milliseconds-post")
                .value_name("MS")
                .help("Milliseconds to pad after censored spans (overrides --pad-milliseconds)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("beep")
                .short('b')
                .long("beep")
                .help("Beep instead of muting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("beep-hertz")
                .long("beep-hertz")
                .value_name("HZ")
                .help("Beep tone frequency")
                .default_value("1000")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("beep-audio-weight")
                .long("beep-audio-weight")
                .value_name("N")
                .help("Mix weight of the original audio in beep mode")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("beep-sine-weight")
                .long("beep-sine-weight")
                .value_name("N")
                .help("Mix weight of each beep tone")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("beep-mix-normalize")
                .long("beep-mix-normalize")
                .help("Normalize the beep mix")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("beep-dropout-transition")
                .long("beep-dropout-transition")
                .value_name("SECONDS")
                .help("amix dropout transition in beep mode")
                .default_value("0")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("channels")
                .long("channels")
                .value_name("N")
                .help("Output audio channels")
                .default_value("2")
                .value_parser(clap::value_parser!(u8)),
        )
        .arg(
            Arg::new("audio-params")
                .short('a')
                .long("audio-params")
                .value_name("ARGS")
                .help("Custom ffmpeg audio encode parameters (space-separated)"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .help("Process the file even when it carries the processed tag")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("whisper-model-name")
                .long("whisper-model-name")
                .value_name("NAME")
                .help("Whisper model name")
                .default_value("small.en"),
        )
        .arg(
            Arg::new("whisper-model-dir")
                .long("whisper-model-dir")
                .value_name("DIR")
                .help("Whisper model download directory")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("vosk-model-dir")
                .long("vosk-model-dir")
                .value_name("DIR")
                .help("Vosk model directory")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (YAML/JSON)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .value_name("NAME")
                .help("Configuration profile to use (from config file)"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Disable progress indicators")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-profiles")
                .long("list-profiles")
                .help("List available configuration profiles")
                .action(ArgAction::SetTrue),
        )
}

async fn parse_config(matches: &clap::ArgMatches) -> Result<Config> {
    if matches.get_flag("list-profiles") {
        let config_file = if let Some(config_path) = matches.get_one::<PathBuf>("config") {
            ConfigFile::load(config_path).await.ok()
        } else {
            ConfigFile::load_from_default_locations().await
        }
        .unwrap_or_default();

        println!("Available configuration profiles:");
        for profile_name in config_file.list_profiles() {
            let profiles = config_file.profiles.as_ref().unwrap();
            let profile = profiles.get(&profile_name).unwrap();
            println!(
                "  {}: {}",
                profile_name,
                profile.description.as_deref().unwrap_or("No description")
            );
        }
        std::process::exit(0);
    }

    let input_file = matches
        .get_one::<PathBuf>("input")
        .ok_or_else(|| wordplug::error::config_error("input", "Input file is required"))?
        .clone();

    let mut builder = ConfigBuilder::new().input_file(input_file);

    // config file settings first; CLI flags override them below
    let config_file = if let Some(config_path) = matches.get_one::<PathBuf>("config") {
        Some(ConfigFile::load(config_path).await?)
    } else {
        ConfigFile::load_from_default_locations().await
    };

    if let Some(ref cf) = config_file {
        if let Some(profile_name) = matches.get_one::<String>("profile") {
            builder = cf.apply_profile_to_builder(profile_name, builder)?;
        } else {
            builder = cf.apply_to_builder(builder)?;
        }
    }

    if let Some(output) = matches.get_one::<PathBuf>("output") {
        builder = builder.output_file(output.clone());
    }
    if let Some(format) = matches.get_one::<String>("format") {
        builder = builder.output_format(format.clone());
    }
    if let Some(engine_str) = matches.get_one::<String>("engine") {
        let engine: Engine = engine_str.parse()?;
        builder = builder.engine(engine);
    }
    if let Some(swears) = matches.get_one::<PathBuf>("swears") {
        builder = builder.swears_file(swears.clone());
    }
    if let Some(transcript) = matches.get_one::<PathBuf>("transcript") {
        builder = builder.transcript_override(transcript.clone());
    }
    if let Some(save) = matches.get_one::<PathBuf>("save-transcript") {
        builder = builder.transcript_cache(save.clone());
    }
    if matches.get_flag("force-retranscribe") {
        builder = builder.force_retranscribe(true);
    }

    let shared_pad = matches.get_one::<u64>("pad-milliseconds").copied();
    let pad_pre = matches.get_one::<u64>("pad-milliseconds-pre").copied();
    let pad_post = matches.get_one::<u64>("pad-milliseconds-post").copied();
    if shared_pad.is_some() || pad_pre.is_some() || pad_post.is_some() {
        let shared = shared_pad.unwrap_or(0);
        builder =
            builder.pads(PadSpec::from_millis(pad_pre.unwrap_or(shared), pad_post.unwrap_or(shared)));
    }

    if matches.get_flag("beep") {
        builder = builder.beep(true);
    }
    if let Some(&hertz) = matches.get_one::<u32>("beep-hertz") {
        builder = builder.beep_hertz(hertz)?;
    }
    builder = builder.beep_mix(BeepMix {
        audio_weight: *matches.get_one::<u32>("beep-audio-weight").unwrap(),
        tone_weight: *matches.get_one::<u32>("beep-sine-weight").unwrap(),
        normalize: matches.get_flag("beep-mix-normalize"),
        dropout_transition: *matches.get_one::<u32>("beep-dropout-transition").unwrap(),
    });

    if let Some(&channels) = matches.get_one::<u8>("channels") {
        builder = builder.channels(channels)?;
    }
    if let Some(params) = matches.get_one::<String>("audio-params") {
        builder = builder.audio_params(params.split_whitespace().map(String::from).collect());
    }
    if matches.get_flag("force") {
        builder = builder.force(true);
    }
    if let Some(name) = matches.get_one::<String>("whisper-model-name") {
        builder = builder.whisper_model_name(name.clone());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("whisper-model-dir") {
        builder = builder.whisper_model_dir(dir.clone());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("vosk-model-dir") {
        builder = builder.vosk_model_dir(dir.clone());
    }

    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = build_cli();
    let matches = app.get_matches();

    if matches.get_flag("verbose") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = parse_config(&matches).await?;
    let show_progress = !matches.get_flag("no-progress");
    let progress = ProgressOperation::new(show_progress);

    info!("Starting wordplug with config: {:?}", config);

    progress
        .with_spinner("Validating system dependencies", |_pb| {
            tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current()
                    .block_on(async { dependencies::validate_dependencies(config.engine).await })
            })
        })
        .await?;

    let output = progress
        .with_spinner("Censoring profanity", |_pb| {
            tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current().block_on(async { pipeline::run(&config).await })
            })
        })
        .await?;

    info!("✓ Successfully created censored file: {}", output.display());
    Ok(())
}
