//! Walks a transcript and accumulates segments into translation chunks
//! of a target character length.

use dub_protocol::{Transcript, TranslationChunk};

const CHUNK_TARGET_CHARS: usize = 400;
const CHUNK_MAX_CHARS: usize = 800;

pub fn chunk_transcript(transcript: &Transcript) -> Vec<TranslationChunk> {
    let mut chunks = Vec::new();
    let mut current_indices: Vec<usize> = Vec::new();
    let mut current_texts: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    let flush = |indices: &mut Vec<usize>, texts: &mut Vec<String>, len: &mut usize, chunks: &mut Vec<TranslationChunk>| {
        if indices.is_empty() {
            return;
        }
        let start_seconds = transcript.segments[indices[0]].start_seconds;
        let end_seconds = transcript.segments[*indices.last().unwrap()].end_seconds;
        chunks.push(TranslationChunk {
            segment_indices: std::mem::take(indices),
            source_text: texts.join(" "),
            original_texts: std::mem::take(texts),
            translated_texts: Vec::new(),
            start_seconds,
            end_seconds,
            review_needed: false,
            refine_rounds: 0,
        });
        *len = 0;
    };

    for (i, segment) in transcript.segments.iter().enumerate() {
        let segment_len = segment.text.chars().count();

        if segment_len > CHUNK_MAX_CHARS {
            flush(&mut current_indices, &mut current_texts, &mut current_len, &mut chunks);
            chunks.push(TranslationChunk {
                segment_indices: vec![i],
                source_text: segment.text.clone(),
                original_texts: vec![segment.text.clone()],
                translated_texts: Vec::new(),
                start_seconds: segment.start_seconds,
                end_seconds: segment.end_seconds,
                review_needed: false,
                refine_rounds: 0,
            });
            continue;
        }

        if current_len + segment_len > CHUNK_MAX_CHARS {
            flush(&mut current_indices, &mut current_texts, &mut current_len, &mut chunks);
        }

        current_indices.push(i);
        current_texts.push(segment.text.clone());
        current_len += segment_len;

        if current_len >= CHUNK_TARGET_CHARS {
            flush(&mut current_indices, &mut current_texts, &mut current_len, &mut chunks);
        }
    }
    flush(&mut current_indices, &mut current_texts, &mut current_len, &mut chunks);

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use dub_protocol::Segment;

    fn segment(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
            speaker_label: None,
            confidence: None,
        }
    }

    #[test]
    fn accumulates_short_segments_into_one_chunk() {
        let transcript = Transcript {
            segments: vec![segment(0.0, 1.0, "hello"), segment(1.0, 2.0, "world")],
        };
        let chunks = chunk_transcript(&transcript);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].segment_indices, vec![0, 1]);
    }

    #[test]
    fn oversized_segment_stands_alone() {
        let huge_text = "a ".repeat(500);
        let transcript = Transcript {
            segments: vec![segment(0.0, 1.0, "short"), segment(1.0, 2.0, &huge_text)],
        };
        let chunks = chunk_transcript(&transcript);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].segment_indices, vec![1]);
    }

    #[test]
    fn splits_once_target_length_is_reached() {
        let segments: Vec<Segment> = (0..20)
            .map(|i| segment(i as f64, i as f64 + 1.0, "twenty characters!!!"))
            .collect();
        let transcript = Transcript { segments };
        let chunks = chunk_transcript(&transcript);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let len: usize = chunk.original_texts.iter().map(|t| t.chars().count()).sum();
            assert!(len <= CHUNK_MAX_CHARS);
        }
    }
}
