//! Tests for animation stream format

use super::*;
use crate::error::FormatError;
use crate::packing::FormatVariant;
use glam::Vec3;

fn frame(offset: f32, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| Vec3::new(offset + i as f32, -(i as f32), 0.5 * i as f32))
        .collect()
}

fn assert_close(a: Vec3, b: Vec3, tolerance: f32) {
    assert!(
        (a - b).abs().max_element() <= tolerance,
        "{a:?} != {b:?} (tolerance {tolerance})"
    );
}

// ========================================================================
// Header Tests
// ========================================================================

#[test]
fn test_animation_header_roundtrip() {
    let header = AnimationStreamHeader::new(90, 400);
    let bytes = header.to_bytes();
    assert_eq!(bytes, [90, 0, 0x90, 0x01]);
    assert_eq!(AnimationStreamHeader::from_bytes(&bytes), Some(header));
}

#[test]
fn test_animation_header_from_short_bytes() {
    assert!(AnimationStreamHeader::from_bytes(&[0u8; 2]).is_none());
}

#[test]
fn test_animation_file_size() {
    let header = AnimationStreamHeader::new(2, 32);
    assert_eq!(header.frame_offset(0), 4);
    assert_eq!(header.frame_offset(1), 36);
    assert_eq!(header.file_size(), 68);
}

// ========================================================================
// Variant Detection Tests
// ========================================================================

#[test]
fn test_detect_standard() {
    let header = AnimationStreamHeader::new(1, 4 * 10);
    assert_eq!(header.detect_variant(10), Some(FormatVariant::Standard));
}

#[test]
fn test_detect_extended() {
    let header = AnimationStreamHeader::new(1, 8 * 10);
    assert_eq!(header.detect_variant(10), Some(FormatVariant::Extended));
}

#[test]
fn test_detect_rejects_other_ratios() {
    let header = AnimationStreamHeader::new(1, 60);
    assert_eq!(header.detect_variant(10), None); // 6 bytes per vertex
    assert_eq!(header.detect_variant(8), None); // 7.5 bytes per vertex
    assert_eq!(header.detect_variant(0), None);
}

#[test]
fn test_parse_reports_unknown_variant() {
    let mut bytes = AnimationStreamHeader::new(1, 12).to_bytes().to_vec();
    bytes.extend_from_slice(&[0; 12]);
    assert_eq!(
        AnimationStream::parse(&bytes, 2).unwrap_err(),
        FormatError::UnknownVariant {
            frame_byte_size: 12,
            vertex_count: 2
        }
    );
}

// ========================================================================
// Encode / Decode Tests
// ========================================================================

#[test]
fn test_encode_layout() {
    let frames = vec![frame(0.0, 8), frame(1.0, 8)];
    let bytes = encode_animation_stream(&frames, FormatVariant::Standard, 1.0).unwrap();
    assert_eq!(bytes.len(), 4 + 2 * 8 * 4);
    assert_eq!(&bytes[0..4], &[2, 0, 32, 0]);

    let bytes = encode_animation_stream(&frames, FormatVariant::Extended, 1.0).unwrap();
    assert_eq!(bytes.len(), 4 + 2 * 8 * 8);
    assert_eq!(&bytes[0..4], &[2, 0, 64, 0]);
}

#[test]
fn test_encode_decode_both_variants() {
    let frames = vec![frame(0.0, 5), frame(10.0, 5), frame(-20.0, 5)];

    for variant in [FormatVariant::Standard, FormatVariant::Extended] {
        let bytes = encode_animation_stream(&frames, variant, 1.0).unwrap();
        let stream = AnimationStream::parse(&bytes, 5).unwrap();
        assert_eq!(stream.variant(), variant);
        assert_eq!(stream.frame_count(), 3);

        let decoded: Vec<_> = stream.frames().collect();
        assert_eq!(decoded.len(), 3);
        for (expected, actual) in frames.iter().zip(&decoded) {
            assert_eq!(actual.positions.len(), 5);
            for (&e, &a) in expected.iter().zip(&actual.positions) {
                assert_close(e, a, 0.125);
            }
        }
    }
}

#[test]
fn test_encode_applies_scale() {
    let frames = vec![vec![Vec3::new(1.0, 2.0, 3.0)]];
    let bytes = encode_animation_stream(&frames, FormatVariant::Extended, 2.0).unwrap();
    let stream = AnimationStream::parse(&bytes, 1).unwrap();
    assert_eq!(stream.position(0, 0), Some(Vec3::new(2.0, 4.0, 6.0)));
}

#[test]
fn test_vertex_count_change_aborts_encode() {
    let frames = vec![frame(0.0, 8), frame(0.0, 7)];
    assert_eq!(
        encode_animation_stream(&frames, FormatVariant::Standard, 1.0),
        Err(FormatError::VertexCountChanged {
            frame: 1,
            expected: 8,
            actual: 7
        })
    );
}

#[test]
fn test_encode_rejects_empty() {
    let frames: Vec<Vec<Vec3>> = Vec::new();
    assert_eq!(
        encode_animation_stream(&frames, FormatVariant::Standard, 1.0),
        Err(FormatError::EmptyAnimation)
    );
    let frames = vec![Vec::<Vec3>::new()];
    assert_eq!(
        encode_animation_stream(&frames, FormatVariant::Standard, 1.0),
        Err(FormatError::EmptyAnimation)
    );
}

#[test]
fn test_encode_rejects_oversized_frame() {
    // 8192 * 8 = 65536 does not fit the u16 frame size
    let frames = vec![vec![Vec3::ZERO; 8192]];
    assert_eq!(
        encode_animation_stream(&frames, FormatVariant::Extended, 1.0),
        Err(FormatError::FrameTooLarge {
            vertex_count: 8192,
            per_vertex: 8
        })
    );
    assert!(encode_animation_stream(&frames, FormatVariant::Standard, 1.0).is_ok());
}

// ========================================================================
// Random Access Tests
// ========================================================================

#[test]
fn test_random_access_matches_iteration() {
    let frames: Vec<_> = (0..6).map(|f| frame(f as f32 * 3.0, 4)).collect();
    let bytes = encode_animation_stream(&frames, FormatVariant::Standard, 1.0).unwrap();
    let stream = AnimationStream::parse(&bytes, 4).unwrap();

    let all: Vec<_> = stream.frames().collect();
    for i in [5, 0, 3, 3] {
        let frame = stream.frame(i).unwrap();
        assert_eq!(frame.index, i);
        assert_eq!(frame, all[i]);
    }

    // Restartable
    assert_eq!(stream.frames().count(), 6);
    assert_eq!(stream.frames().len(), 6);
}

#[test]
fn test_frame_out_of_range() {
    let frames = vec![frame(0.0, 2)];
    let bytes = encode_animation_stream(&frames, FormatVariant::Standard, 1.0).unwrap();
    let stream = AnimationStream::parse(&bytes, 2).unwrap();
    assert_eq!(
        stream.frame(1).unwrap_err(),
        FormatError::FrameOutOfRange {
            frame: 1,
            frame_count: 1
        }
    );
    assert_eq!(stream.position(0, 2), None);
}

#[test]
fn test_frame_range() {
    let frames: Vec<_> = (0..5).map(|f| frame(f as f32, 3)).collect();
    let bytes = encode_animation_stream(&frames, FormatVariant::Standard, 1.0).unwrap();
    let stream = AnimationStream::parse(&bytes, 3).unwrap();

    let indices: Vec<_> = stream.frame_range(1, 3).map(|f| f.index).collect();
    assert_eq!(indices, [1, 2]);
    assert_eq!(stream.frame_range(3, 100).len(), 2);
    assert_eq!(stream.frame_range(7, 100).count(), 0);
}

#[test]
fn test_parse_short_buffer() {
    let frames = vec![frame(0.0, 4), frame(1.0, 4)];
    let bytes = encode_animation_stream(&frames, FormatVariant::Standard, 1.0).unwrap();
    assert_eq!(
        AnimationStream::parse(&bytes[..bytes.len() - 1], 4).unwrap_err(),
        FormatError::BufferTooShort {
            expected: 36,
            actual: 35
        }
    );
    assert_eq!(
        AnimationStream::parse(&bytes[..3], 4).unwrap_err(),
        FormatError::BufferTooShort {
            expected: 4,
            actual: 3
        }
    );
}

#[test]
fn test_forced_variant() {
    let frames = vec![frame(0.0, 4)];
    let bytes = encode_animation_stream(&frames, FormatVariant::Extended, 1.0).unwrap();

    let stream = AnimationStream::parse_with_variant(&bytes, 4, FormatVariant::Extended).unwrap();
    assert_eq!(stream.variant(), FormatVariant::Extended);

    // A STANDARD read of an EXTENDED stream fits but strides by the header
    let stream = AnimationStream::parse_with_variant(&bytes, 4, FormatVariant::Standard).unwrap();
    assert_eq!(stream.frame(0).unwrap().positions.len(), 4);

    let bytes = encode_animation_stream(&frames, FormatVariant::Standard, 1.0).unwrap();
    assert_eq!(
        AnimationStream::parse_with_variant(&bytes, 4, FormatVariant::Extended).unwrap_err(),
        FormatError::FrameSizeMismatch {
            frame_byte_size: 16,
            required: 32
        }
    );
}

#[test]
fn test_concurrent_random_access() {
    let frames: Vec<_> = (0..8).map(|f| frame(f as f32, 16)).collect();
    let bytes = encode_animation_stream(&frames, FormatVariant::Extended, 1.0).unwrap();
    let stream = AnimationStream::parse(&bytes, 16).unwrap();

    std::thread::scope(|scope| {
        for i in 0..8 {
            let stream = &stream;
            scope.spawn(move || {
                let frame = stream.frame(i).unwrap();
                assert_eq!(frame.positions.len(), 16);
            });
        }
    });
}
