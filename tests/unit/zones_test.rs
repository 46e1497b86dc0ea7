//! Unit tests for heart rate and velocity zone classification.

use pulsetrack::metrics::zones::{
    HrZone, HrZoneConfig, HrZoneTally, VelocityZone, VelocityZoneConfig,
};

#[test]
fn test_hr_zones_for_custom_max_hr() {
    let zones = HrZoneConfig {
        max_hr: 180.0,
        ..Default::default()
    };

    // 50% of 180 = 90 bpm
    assert_eq!(zones.classify(89.0), HrZone::Z1);
    assert_eq!(zones.classify(90.0), HrZone::Z2);
    // 80% of 180 = 144 bpm
    assert_eq!(zones.classify(143.0), HrZone::Z4);
    assert_eq!(zones.classify(144.0), HrZone::Z5);
    assert_eq!(zones.classify(175.0), HrZone::Z6);
}

#[test]
fn test_every_bpm_maps_to_a_zone() {
    let zones = HrZoneConfig::default();
    let mut last = HrZone::Z1;

    for bpm in 0..=300 {
        let zone = zones.classify(bpm as f32);
        assert!(zone.index() < HrZone::COUNT);
        // Zones never go down as BPM rises
        assert!(zone >= last);
        last = zone;
    }
    assert_eq!(last, HrZone::Z6);
}

#[test]
fn test_trimp_weights_per_zone() {
    let zones = HrZoneConfig::default();

    let weights: Vec<f32> = HrZone::ALL.iter().map(|&z| zones.trimp_weight(z)).collect();
    assert_eq!(weights, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_hr_zone_lower_bounds() {
    let zones = HrZoneConfig::default();

    assert_eq!(zones.lower_bpm(HrZone::Z1), 0.0);
    assert!((zones.lower_bpm(HrZone::Z3) - 120.0).abs() < 1e-3);
    assert!((zones.lower_bpm(HrZone::Z6) - 180.0).abs() < 1e-3);
}

#[test]
fn test_velocity_bins_closed_open() {
    let zones = VelocityZoneConfig {
        bins_kmh: [6.0, 12.0, 24.0],
    };

    assert_eq!(zones.classify(5.99), VelocityZone::Walking);
    assert_eq!(zones.classify(6.0), VelocityZone::Jogging);
    assert_eq!(zones.classify(12.0), VelocityZone::Running);
    assert_eq!(zones.classify(23.9), VelocityZone::Running);
    assert_eq!(zones.classify(24.0), VelocityZone::Sprinting);
}

#[test]
fn test_zone_display() {
    assert_eq!(HrZone::Z3.to_string(), "Z3");
    assert_eq!(VelocityZone::Running.to_string(), "Running");
}

#[test]
fn test_hr_tally_counts_seconds() {
    let zones = HrZoneConfig::default();
    let mut tally = HrZoneTally::new();

    for bpm in [0.0, 95.0, 150.0, 150.0, 185.0] {
        tally.add_second(zones.classify(bpm).index(), 0.0);
    }

    assert_eq!(tally.seconds, [2, 0, 0, 2, 0, 1]);
    assert_eq!(tally.total_seconds(), 5);
}
