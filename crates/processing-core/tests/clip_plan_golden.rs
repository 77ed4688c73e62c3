use reelcut_clip_model::layout::{Rect, Size};
use reelcut_clip_model::segment::SegmentDescriptor;
use reelcut_clip_model::transcript::{Transcript, WordTiming};
use reelcut_common::config::{CaptionConfig, LayoutConfig};
use reelcut_processing_core::{plan_layout, segment_captions, subtitles, SegmenterConfig};

/// Eighty 0.4s words spoken every half second from t=5s to t=45s.
fn steady_speech() -> Transcript {
    Transcript::new(
        (0..80)
            .map(|i| {
                let start = 5.0 + 0.5 * i as f64;
                WordTiming::new(format!("w{i:02}"), start, start + 0.4)
            })
            .collect(),
    )
}

fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[test]
fn landscape_source_layout_is_stable() {
    let layout = plan_layout(
        Size::new(1920, 1080),
        Size::VERTICAL_HD,
        &LayoutConfig::default(),
    );

    assert_eq!(layout.foreground_rect(), Rect::new(30, 673, 1020, 574));
    assert_eq!(layout.background_scaled, Size::new(3413, 1920));
    assert_eq!(layout.background_crop, Rect::new(1166, 0, 1080, 1920));
}

#[test]
fn thirty_second_clip_captions_signature_is_stable() {
    let transcript = steady_speech();
    let window = SegmentDescriptor::new(10.0, 40.0)
        .window(60.0)
        .expect("window should be valid");
    let config = SegmenterConfig::from(&CaptionConfig::default());

    let chunks = segment_captions(transcript.words(), window, &config);

    let signature = chunks
        .iter()
        .map(|c| {
            format!(
                "{}|{:.3}|{:.3}|{}",
                c.text, c.relative_start, c.relative_end, c.word_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    assert_eq!(chunks.len(), 15);
    assert_eq!(chunks[0].text, "w10 w11 w12 w13");
    assert_eq!(chunks[0].relative_start, 0.0);
    assert_eq!(chunks[14].text, "w66 w67 w68 w69");
    assert!((chunks[14].relative_end - 29.9).abs() < 1e-9);
    assert_eq!(fnv1a_64(&signature), 0xe6768a93d513bb8d);
}

#[test]
fn sidecar_matches_burned_in_chunks() {
    let transcript = steady_speech();
    let window = SegmentDescriptor::new(10.0, 40.0).window(60.0).unwrap();
    let chunks = segment_captions(transcript.words(), window, &SegmenterConfig::default());

    let srt = subtitles::generate_srt(&chunks);
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,900\nw10 w11 w12 w13\n\n"));
    assert!(srt.contains("15\n00:00:28,000 --> 00:00:29,900\nw66 w67 w68 w69"));
}

#[test]
fn single_word_chunks_reproduce_per_word_captions() {
    let transcript = steady_speech();
    let window = SegmentDescriptor::new(10.0, 40.0).window(60.0).unwrap();
    let config = SegmenterConfig {
        chunk_size: 1,
        ..SegmenterConfig::default()
    };

    let chunks = segment_captions(transcript.words(), window, &config);
    assert_eq!(chunks.len(), 60);
    assert!(chunks.iter().all(|c| c.word_count == 1));
    assert_eq!(chunks.len(), transcript.words_in(&window).len());
}
