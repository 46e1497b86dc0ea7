//! Unit tests for the filter bank, speed smoother and sprint detector.

use pulsetrack::metrics::filter::{Biquad, BiquadCoefficients, EcgFilter, FilterBank};
use pulsetrack::metrics::smoothing::{MovingAverage, RingBuffer, SmoothingConfig, SpeedSmoother};
use pulsetrack::metrics::sprint::{SprintConfig, SprintDetector};

#[test]
fn test_pass_through_section() {
    let mut bank = FilterBank::new([BiquadCoefficients::new(1.0, 0.0, 0.0, 0.0, 0.0)]);
    for x in [0.0, 3.5, -2.0, 4095.0] {
        assert_eq!(bank.process(x), x);
    }
}

#[test]
fn test_biquad_one_sample_delay() {
    // y[n] = x[n-1]
    let mut section = Biquad::new(BiquadCoefficients::new(0.0, 1.0, 0.0, 0.0, 0.0));

    assert_eq!(section.process(5.0), 0.0);
    assert_eq!(section.process(7.0), 5.0);
    assert_eq!(section.process(0.0), 7.0);
}

#[test]
fn test_ecg_filter_is_deterministic_and_resettable() {
    let input: Vec<f32> = (0..300).map(|k| 2048.0 + ((k * 37) % 400) as f32).collect();

    let mut a = EcgFilter::default();
    let first: Vec<f32> = input.iter().map(|&x| a.process(x)).collect();

    a.reset();
    let again: Vec<f32> = input.iter().map(|&x| a.process(x)).collect();

    let mut b = EcgFilter::default();
    let fresh: Vec<f32> = input.iter().map(|&x| b.process(x)).collect();

    assert_eq!(first, again);
    assert_eq!(first, fresh);
}

#[test]
fn test_ecg_filter_impulse_decays() {
    let mut filter = EcgFilter::default();
    filter.process(1000.0);
    let mut tail = 0.0f32;
    for _ in 0..600 {
        tail = filter.process(0.0);
    }
    assert!(tail.abs() < 1e-3);
}

#[test]
fn test_ring_buffer_overwrites_oldest() {
    let mut ring: RingBuffer<u32, 3> = RingBuffer::new();
    assert_eq!(ring.push(1), None);
    assert_eq!(ring.push(2), None);
    assert_eq!(ring.push(3), None);
    assert_eq!(ring.push(4), Some(1));

    assert_eq!(ring.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    assert!(ring.is_full());
    assert_eq!(ring.len(), ring.capacity());
}

#[test]
fn test_moving_average_partial_window() {
    let mut avg: MovingAverage<5> = MovingAverage::new();
    assert_eq!(avg.average(), None);

    assert_eq!(avg.add(10.0), 10.0);
    assert_eq!(avg.add(20.0), 15.0);
    for _ in 0..5 {
        avg.add(8.0);
    }
    assert_eq!(avg.average(), Some(8.0));
    assert!(avg.is_full());
}

#[test]
fn test_speed_smoother_floors_jitter() {
    let mut smoother = SpeedSmoother::default();

    // GPS jitter while standing
    assert_eq!(smoother.smooth(0.4), 0.0);
    assert_eq!(smoother.smooth(0.6), 0.0);

    let mut custom = SpeedSmoother::new(SmoothingConfig { stationary_kmh: 2.0 });
    assert_eq!(custom.smooth(1.5), 0.0);
    assert_eq!(custom.smooth(4.5), 3.0);
}

#[test]
fn test_speed_smoother_constant_input() {
    let mut smoother = SpeedSmoother::default();
    for _ in 0..12 {
        assert_eq!(smoother.smooth(12.5), 12.5);
    }
}

#[test]
fn test_single_fast_second_is_not_a_sprint() {
    let mut det = SprintDetector::default();

    assert!(!det.update(20.0));
    assert!(!det.update(19.9));
    assert!(!det.update(20.0));
    assert_eq!(det.total_count(), 0);
}

#[test]
fn test_sprint_needs_configured_hold() {
    let mut det = SprintDetector::new(SprintConfig {
        threshold_kmh: 18.0,
        confirm_secs: 3,
    });

    assert!(!det.update(18.0));
    assert!(!det.update(19.0));
    assert!(det.update(21.0));

    // Drop below, then a second sprint
    assert!(!det.update(10.0));
    assert!(!det.in_sprint());
    for _ in 0..2 {
        det.update(25.0);
    }
    assert!(det.update(25.0));
    assert_eq!(det.minute_count(), 2);

    det.reset_minute();
    assert_eq!(det.minute_count(), 0);
    assert_eq!(det.total_count(), 2);
    assert!(!det.in_sprint());
}
