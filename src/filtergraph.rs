use crate::intervals::{BeepPlan, Interval, MuteRegion, FADE_MILLIS};

/// An encoder-consumable description of the audio transformation. Always
/// structured and pre-tokenized; the encoder maps it straight onto ffmpeg
/// arguments without any further parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDirective {
    /// Pass-through audio, no filter arguments at all
    Empty,
    /// An ordered filter chain, rendered as a single `-af` argument
    Chain(Vec<String>),
    /// A labeled filter graph, rendered as a single `-filter_complex` argument
    Graph(String),
}

impl FilterDirective {
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterDirective::Empty)
    }

    /// Token bundle for the ffmpeg invocation
    pub fn as_ffmpeg_args(&self) -> Vec<String> {
        match self {
            FilterDirective::Empty => Vec::new(),
            FilterDirective::Chain(entries) => {
                vec!["-af".to_string(), entries.join(",")]
            }
            FilterDirective::Graph(graph) => {
                vec!["-filter_complex".to_string(), graph.clone()]
            }
        }
    }
}

/// Mix parameters for the beep graph's final amix stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeepMix {
    pub audio_weight: u32,
    pub tone_weight: u32,
    pub normalize: bool,
    pub dropout_transition: u32,
}

impl Default for BeepMix {
    fn default() -> Self {
        Self {
            audio_weight: 1,
            tone_weight: 1,
            normalize: false,
            dropout_transition: 0,
        }
    }
}

fn fmt3(value: f64) -> String {
    format!("{:.3}", value)
}

/// Build the mute-mode filter chain: per region a fade-out anchored at the
/// region start and a fade-in anchored at the region end, enabled up to the
/// next region's padded start. Empty input yields the empty directive.
pub fn build_mute_chain(regions: &[MuteRegion]) -> FilterDirective {
    if regions.is_empty() {
        return FilterDirective::Empty;
    }

    let mut entries = Vec::with_capacity(regions.len() * 2);
    for region in regions {
        let start = fmt3(region.interval.start);
        let end = fmt3(region.interval.end);
        let peek = fmt3(region.fade_in_until);
        entries.push(format!(
            "afade=enable='between(t,{start},{end})':t=out:st={start}:d={FADE_MILLIS}ms"
        ));
        entries.push(format!(
            "afade=enable='between(t,{end},{peek})':t=in:st={end}:d={FADE_MILLIS}ms"
        ));
    }

    FilterDirective::Chain(entries)
}

fn mute_entry(interval: &Interval) -> String {
    format!(
        "volume=enable='between(t,{},{})':volume=0",
        fmt3(interval.start),
        fmt3(interval.end)
    )
}

/// Build the beep-mode filter graph: the original audio through the
/// silence chain into `[mute]`, each tone generated, trimmed, and delayed
/// into its own sequentially numbered node, then everything combined by a
/// single amix with one weight for the audio and the tone weight repeated
/// per tone. Empty input yields the empty directive.
pub fn build_beep_graph(plan: &BeepPlan, mix: &BeepMix) -> FilterDirective {
    if plan.regions.is_empty() {
        return FilterDirective::Empty;
    }

    let mute_chain = plan
        .regions
        .iter()
        .map(mute_entry)
        .collect::<Vec<_>>()
        .join(",");

    let sine_nodes = plan
        .tones
        .iter()
        .enumerate()
        .map(|(i, tone)| {
            format!(
                "sine=f={}:duration={}[beep{}]",
                tone.frequency_hz,
                fmt3(tone.duration),
                i + 1
            )
        })
        .collect::<Vec<_>>()
        .join(";");

    let delay_nodes = plan
        .tones
        .iter()
        .zip(&plan.delays)
        .enumerate()
        .map(|(i, (tone, delay))| {
            format!(
                "[beep{n}]atrim=0:{dur},adelay={ms}|{ms}[beep{n}_delayed]",
                n = i + 1,
                dur = fmt3(tone.duration),
                ms = delay.offset_millis
            )
        })
        .collect::<Vec<_>>()
        .join(";");

    let mix_inputs: String = (1..=plan.tones.len())
        .map(|i| format!("[beep{}_delayed]", i))
        .collect();

    let weights = std::iter::once(mix.audio_weight.to_string())
        .chain(plan.tones.iter().map(|_| mix.tone_weight.to_string()))
        .collect::<Vec<_>>()
        .join(" ");

    let graph = format!(
        "[0:a]{mute_chain}[mute];{sine_nodes};{delay_nodes};[mute]{mix_inputs}amix=inputs={inputs}:normalize={normalize}:dropout_transition={dropout}:weights={weights}",
        inputs = plan.tones.len() + 1,
        normalize = mix.normalize,
        dropout = mix.dropout_transition,
    );

    FilterDirective::Graph(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervals::{synthesize_beep, synthesize_mute, PadSpec};
    use crate::transcript::Word;

    fn naughty(spans: &[(f64, f64)]) -> Vec<Word> {
        spans
            .iter()
            .map(|&(start, end)| {
                let mut w = Word::new("darn", start, end, 1.0);
                w.scrub = true;
                w
            })
            .collect()
    }

    #[test]
    fn test_empty_inputs_yield_empty_directive() {
        assert_eq!(build_mute_chain(&[]), FilterDirective::Empty);
        let plan = synthesize_beep(&[], PadSpec::default(), 1000).unwrap();
        assert_eq!(build_beep_graph(&plan, &BeepMix::default()), FilterDirective::Empty);
        assert!(FilterDirective::Empty.as_ffmpeg_args().is_empty());
    }

    #[test]
    fn test_mute_chain_fade_anchors() {
        let regions = synthesize_mute(&naughty(&[(0.5, 1.0)]), PadSpec::default()).unwrap();
        let directive = build_mute_chain(&regions);

        let args = directive.as_ffmpeg_args();
        assert_eq!(args[0], "-af");
        assert!(args[1].contains("t=out:st=0.500"));
        assert!(args[1].contains("t=in:st=1.000"));
        assert!(args[1].contains("d=5ms"));
    }

    #[test]
    fn test_mute_chain_pairs_in_chronological_order() {
        let regions =
            synthesize_mute(&naughty(&[(1.0, 1.5), (3.0, 3.5)]), PadSpec::default()).unwrap();
        let directive = build_mute_chain(&regions);

        match &directive {
            FilterDirective::Chain(entries) => {
                assert_eq!(entries.len(), 4);
                assert!(entries[0].contains("t=out:st=1.000"));
                assert!(entries[1].contains("t=in:st=1.500"));
                // second word's fade-in window is bounded by the peek boundary
                assert!(entries[1].contains("between(t,1.500,3.000)"));
                assert!(entries[2].contains("t=out:st=3.000"));
            }
            other => panic!("Expected a chain directive, got {:?}", other),
        }
    }

    #[test]
    fn test_overlapping_words_never_emit_negative_fade() {
        // padded spans [0.9, 1.7] and [1.5, 2.2] merge into one region
        let pads = PadSpec { pre: 0.1, post: 0.2 };
        let regions = synthesize_mute(&naughty(&[(1.0, 1.5), (1.6, 2.0)]), pads).unwrap();
        let directive = build_mute_chain(&regions);

        match &directive {
            FilterDirective::Chain(entries) => {
                assert_eq!(entries.len(), 2, "merged region emits one fade pair");
                assert!(entries[0].contains("between(t,0.900,2.200)"));
            }
            other => panic!("Expected a chain directive, got {:?}", other),
        }
    }

    #[test]
    fn test_beep_graph_shape() {
        let plan = synthesize_beep(&naughty(&[(2.0, 2.5)]), PadSpec::default(), 1000).unwrap();
        let directive = build_beep_graph(&plan, &BeepMix::default());

        let args = directive.as_ffmpeg_args();
        assert_eq!(args[0], "-filter_complex");
        let graph = &args[1];
        assert!(graph.starts_with("[0:a]volume=enable='between(t,2.000,2.500)':volume=0[mute]"));
        assert!(graph.contains("sine=f=1000:duration=0.500[beep1]"));
        assert!(graph.contains("[beep1]atrim=0:0.500,adelay=2000|2000[beep1_delayed]"));
        assert!(graph.contains("[mute][beep1_delayed]amix=inputs=2"));
        assert!(graph.contains("normalize=false"));
        assert!(graph.contains("dropout_transition=0"));
        assert!(graph.contains("weights=1 1"));
    }

    #[test]
    fn test_beep_graph_numbers_nodes_sequentially() {
        let plan =
            synthesize_beep(&naughty(&[(1.0, 1.5), (3.0, 3.5)]), PadSpec::default(), 800).unwrap();
        let directive = build_beep_graph(&plan, &BeepMix::default());

        match &directive {
            FilterDirective::Graph(graph) => {
                assert!(graph.contains("[beep1]"));
                assert!(graph.contains("[beep2]"));
                assert!(graph.contains("[beep1_delayed]"));
                assert!(graph.contains("[beep2_delayed]"));
                assert!(graph.contains("amix=inputs=3"));
            }
            other => panic!("Expected a graph directive, got {:?}", other),
        }
    }

    #[test]
    fn test_beep_graph_mix_options() {
        let plan = synthesize_beep(&naughty(&[(1.0, 1.5)]), PadSpec::default(), 1000).unwrap();
        let mix = BeepMix {
            audio_weight: 2,
            tone_weight: 3,
            normalize: true,
            dropout_transition: 1,
        };
        let directive = build_beep_graph(&plan, &mix);

        match &directive {
            FilterDirective::Graph(graph) => {
                assert!(graph.contains("normalize=true"));
                assert!(graph.contains("dropout_transition=1"));
                assert!(graph.contains("weights=2 3"));
            }
            other => panic!("Expected a graph directive, got {:?}", other),
        }
    }

    #[test]
    fn test_end_to_end_single_word_scenario() {
        // hello / damn / world with only "damn" naughty
        let words = naughty(&[(0.5, 1.0)]);
        let regions = synthesize_mute(&words, PadSpec::default()).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].interval.start, 0.5);
        assert_eq!(regions[0].interval.end, 1.0);

        let directive = build_mute_chain(&regions);
        let args = directive.as_ffmpeg_args();
        assert!(args[1].contains("t=out:st=0.500"));
        assert!(args[1].contains("t=in:st=1.000"));
    }
}
