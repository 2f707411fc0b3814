// SPDX-License-Identifier: LGPL-3.0-or-later
//
// Streaming STFT round trips: analyse a multichannel block, copy the first
// input channel's spectra to every output channel, synthesise, and check
// that the outputs reproduce the first input after the reported latency.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use streamdsp_units::stft::{Stft, StftConfig};
use streamdsp_units::{FrameLayout, TfFrame};

const TOLERANCE: f32 = 1e-6;

/// Generate a deterministic pseudo-random test signal in [-1, 1].
fn gen_test_signal(seed: u64, channels: usize, len: usize) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..channels)
        .map(|_| (0..len).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect())
        .collect()
}

/// Run `signal` through `stft` block by block, feeding the spectra of
/// input channel 0 to every output channel.
fn process(stft: &mut Stft, signal: &[Vec<f32>], block: usize) -> Vec<Vec<f32>> {
    let len = signal[0].len();
    let out_channels = stft.out_channels();
    let mut in_frame = stft.new_frame(stft.in_channels(), block).unwrap();
    let mut out_frame = stft.new_frame(out_channels, block).unwrap();
    let mut in_block = vec![vec![0.0f32; block]; stft.in_channels()];
    let mut out_block = vec![vec![0.0f32; block]; out_channels];
    let mut result = vec![vec![0.0f32; len]; out_channels];

    for start in (0..len - block + 1).step_by(block) {
        for (dst, src) in in_block.iter_mut().zip(signal) {
            dst.copy_from_slice(&src[start..start + block]);
        }
        stft.forward(&in_block, &mut in_frame).unwrap();
        for ch in 0..out_channels {
            out_frame.copy_channel_from(ch, &in_frame, 0).unwrap();
        }
        stft.backward(&out_frame, &mut out_block).unwrap();
        for (dst, src) in result.iter_mut().zip(&out_block) {
            dst[start..start + block].copy_from_slice(src);
        }
    }
    result
}

fn assert_delayed(input: &[f32], output: &[f32], delay: usize, check_len: usize) {
    for i in 0..check_len {
        let (x, y) = (input[i], output[i + delay]);
        assert!(
            (x - y).abs() <= TOLERANCE,
            "sample {i}: input={x} output={y} (delay {delay})"
        );
    }
}

#[test]
fn half_overlap_roundtrip_after_channel_change() {
    let (in_ch, out_ch, block) = (62, 64, 512);
    let signal = gen_test_signal(1, in_ch, 16384);

    let mut stft = Stft::new(StftConfig {
        window_size: 128,
        hop_size: 64,
        in_channels: in_ch,
        out_channels: out_ch,
        ..StftConfig::default()
    })
    .unwrap();
    stft.channel_change(123, 7).unwrap();
    stft.flush();
    stft.channel_change(in_ch, out_ch).unwrap();
    assert_eq!(stft.in_channels(), in_ch);
    assert_eq!(stft.out_channels(), out_ch);
    assert_eq!(stft.latency(), 64);

    let output = process(&mut stft, &signal, block);
    let check_len = signal[0].len() - block;
    assert_delayed(&signal[0], &output[0], stft.latency(), check_len);
    assert_delayed(&signal[0], &output[out_ch - 1], stft.latency(), check_len);
}

#[test]
fn roundtrip_after_mid_stream_channel_change() {
    let mut stft = Stft::new(StftConfig {
        window_size: 128,
        hop_size: 64,
        in_channels: 2,
        out_channels: 2,
        ..StftConfig::default()
    })
    .unwrap();

    // Leave non-zero state in every sliding window and accumulator
    let warmup = process(&mut stft, &gen_test_signal(8, 2, 2048), 256);
    assert!(warmup[1].iter().any(|&y| y != 0.0));

    stft.channel_change(3, 4).unwrap();
    stft.flush();
    assert_eq!(stft.in_channels(), 3);
    assert_eq!(stft.out_channels(), 4);

    let signal = gen_test_signal(9, 3, 4096);
    let output = process(&mut stft, &signal, 256);
    let check_len = signal[0].len() - 256;
    // Channel 3 did not exist before the change
    for y in &output {
        assert_delayed(&signal[0], y, stft.latency(), check_len);
    }
    // Nothing from before the change leaks into the first hop
    assert!(output[3][..stft.latency()].iter().all(|&y| y.abs() <= TOLERANCE));
}

#[test]
fn lti_roundtrip_has_no_delay() {
    let (in_ch, out_ch, block) = (62, 64, 128);
    let signal = gen_test_signal(2, in_ch, 8192);

    let mut stft = Stft::new(StftConfig {
        window_size: 128,
        hop_size: 128,
        in_channels: in_ch,
        out_channels: out_ch,
        ..StftConfig::default()
    })
    .unwrap();
    assert_eq!(stft.latency(), 0);

    let output = process(&mut stft, &signal, block);
    assert_delayed(&signal[0], &output[out_ch - 1], 0, signal[0].len() - block);
}

#[test]
fn quarter_hop_zero_padded_roundtrip() {
    for layout in [FrameLayout::BandsChannelsTime, FrameLayout::TimeChannelsBands] {
        let signal = gen_test_signal(3, 2, 4096);
        let mut stft = Stft::new(StftConfig {
            window_size: 256,
            hop_size: 64,
            fft_size: Some(512),
            in_channels: 2,
            out_channels: 3,
            layout,
        })
        .unwrap();
        assert_eq!(stft.num_bands(), 257);
        assert_eq!(stft.latency(), 192);

        let output = process(&mut stft, &signal, 256);
        let check_len = signal[0].len() - 512;
        for y in &output {
            assert_delayed(&signal[0], y, stft.latency(), check_len);
        }
    }
}

#[test]
fn flush_restores_initial_state() {
    let signal = gen_test_signal(4, 1, 2048);
    let config = StftConfig {
        window_size: 128,
        hop_size: 32,
        ..StftConfig::default()
    };

    let mut fresh = Stft::new(config).unwrap();
    let expected = process(&mut fresh, &signal, 256);

    let mut used = Stft::new(config).unwrap();
    process(&mut used, &gen_test_signal(5, 1, 1024), 256);
    used.flush();
    used.flush();
    let actual = process(&mut used, &signal, 256);

    assert_eq!(expected, actual);
}

#[test]
fn block_size_does_not_change_output() {
    let signal = gen_test_signal(6, 1, 4096);
    let config = StftConfig {
        window_size: 256,
        hop_size: 128,
        ..StftConfig::default()
    };

    let small = process(&mut Stft::new(config).unwrap(), &signal, 128);
    let large = process(&mut Stft::new(config).unwrap(), &signal, 1024);
    for (a, b) in small[0].iter().zip(&large[0]) {
        assert!((a - b).abs() <= TOLERANCE);
    }
}

#[test]
fn frames_are_exchangeable_between_layouts() {
    let signal = gen_test_signal(7, 1, 512);
    let mut stft = Stft::new(StftConfig {
        window_size: 128,
        hop_size: 64,
        ..StftConfig::default()
    })
    .unwrap();

    let mut frame = stft.new_frame(1, 512).unwrap();
    stft.forward(&signal, &mut frame).unwrap();

    let (bands, channels, slots) = frame.shape();
    let mut other = TfFrame::new(bands, channels, slots, FrameLayout::TimeChannelsBands);
    other.copy_channel_from(0, &frame, 0).unwrap();
    for band in 0..bands {
        for slot in 0..slots {
            assert_eq!(frame.get(band, 0, slot), other.get(band, 0, slot));
        }
    }
}
