//! End-to-end detector scenarios: single peaks, consolidation, clustered
//! resistance, mode selectivity, stability, and momentum.

use breakscan_core::detector::{Detector, DetectorConfig};
use breakscan_core::domain::{Bar, Measure};
use breakscan_core::features::FeatureCalculator;
use breakscan_core::scoring::QualityScorer;
use chrono::NaiveDate;

/// Bar with open == close so body_top tracks the close exactly.
fn flat_bar(day: usize, close: f64) -> Bar {
    Bar {
        date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(day as i64),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1000.0,
    }
}

fn detector() -> Detector {
    Detector::new("SCEN", DetectorConfig::default()).unwrap()
}

/// Closes for a rise-to-110, dip-to-95 shape over bars 0..=14.
fn single_peak_prelude() -> Vec<f64> {
    vec![
        100.0, 102.0, 104.0, 106.0, 108.0, // 0..=4 rising
        110.0, // 5: the peak
        107.0, 104.0, 101.0, 98.0, 96.0, 95.0, // 6..=11 dipping
        96.0, 97.0, 98.0, // 12..=14 drifting
    ]
}

#[test]
fn single_peak_single_breakout_supersedes() {
    let mut d = detector();
    for (day, close) in single_peak_prelude().into_iter().enumerate() {
        assert!(d.add_bar(&flat_bar(day, close)).unwrap().is_none());
    }
    // Exactly one active peak after the dip: the 110 top at bar 5.
    assert_eq!(d.active_peaks().len(), 1);
    let peak = d.active_peaks()[0].clone();
    assert_eq!(peak.index, 5);
    assert!((peak.price - 110.0).abs() < 1e-12);

    // Bar 15 pushes 9% through the peak: broken AND removed.
    let info = d.add_bar(&flat_bar(15, 120.0)).unwrap().unwrap();
    assert_eq!(info.index, 15);
    assert_eq!(info.broken_peaks.len(), 1);
    assert_eq!(info.broken_peaks[0].id, peak.id);
    assert_eq!(info.superseded_peaks.len(), 1);
    assert!(d.active_peaks().is_empty());

    for (day, close) in [(16, 118.0), (17, 117.0), (18, 116.0), (19, 115.0)] {
        d.add_bar(&flat_bar(day, close)).unwrap();
    }
    assert_eq!(d.breakout_history().len(), 1);
}

#[test]
fn shallow_breakout_consolidates() {
    let mut d = detector();
    for (day, close) in single_peak_prelude().into_iter().enumerate() {
        d.add_bar(&flat_bar(day, close)).unwrap();
    }

    // 110.8 penetrates the exceed margin but not the supersede margin.
    let info = d.add_bar(&flat_bar(15, 110.8)).unwrap().unwrap();
    assert_eq!(info.broken_peaks.len(), 1);
    assert!(info.superseded_peaks.is_empty());
    assert_eq!(info.broken_peaks[0].right_suppression_days, 15 - 5 - 1);

    // The peak stays active and can be broken again.
    assert_eq!(d.active_peaks().len(), 1);
    assert_eq!(d.active_peaks()[0].right_suppression_days, 9);
}

#[test]
fn clustered_peaks_break_together() {
    let mut d = detector();
    let mut closes = vec![90.0; 36];
    closes[5] = 100.0;
    closes[15] = 101.0;
    closes[25] = 102.0;
    closes[35] = 106.0;
    let mut last_info = None;
    for (day, &close) in closes.iter().enumerate() {
        if let Some(info) = d.add_bar(&flat_bar(day, close)).unwrap() {
            last_info = Some(info);
        }
    }

    let info = last_info.expect("bar 35 breaks the cluster");
    assert_eq!(info.index, 35);
    assert_eq!(info.broken_peaks.len(), 3);
    assert_eq!(info.superseded_peaks.len(), 3);
    assert!(d.active_peaks().is_empty());

    let mut prices: Vec<f64> = info.broken_peaks.iter().map(|p| p.price).collect();
    prices.sort_by(f64::total_cmp);
    assert_eq!(prices, vec![100.0, 101.0, 102.0]);

    // Three tightly clustered peaks: the resistance-test bonus fires at 1.25.
    let calc = FeatureCalculator::default();
    let mut breakout = calc.enrich(d.bars(), &info, "SCEN", Some(&d));
    let scorer = QualityScorer::default();
    scorer.score(&mut breakout);
    let breakdown = scorer.breakdown(&breakout);
    let test_row = breakdown
        .bonuses
        .iter()
        .find(|b| b.name == "test_bonus")
        .unwrap();
    assert_eq!(test_row.raw_value, 3.0);
    assert_eq!(test_row.multiplier, 1.25);
}

#[test]
fn close_mode_is_strict_about_wicks() {
    let cfg = DetectorConfig {
        breakout_modes: vec![Measure::Close],
        ..Default::default()
    };
    let mut d = Detector::new("SCEN", cfg).unwrap();
    let mut closes = vec![90.0; 13];
    closes[5] = 100.0;
    for (day, &close) in closes.iter().enumerate() {
        d.add_bar(&flat_bar(day, close)).unwrap();
    }
    assert_eq!(d.active_peaks().len(), 1);

    // High spikes to 120 while the close finishes at 99: no breakout.
    let wick = Bar {
        date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(13),
        open: 99.0,
        high: 120.0,
        low: 98.0,
        close: 99.0,
        volume: 1000.0,
    };
    assert!(d.add_bar(&wick).unwrap().is_none());
    assert_eq!(d.active_peaks().len(), 1);
}

#[test]
fn stability_measures_forward_holding() {
    let mut d = detector();
    let mut closes = vec![90.0; 12];
    closes[5] = 100.0;
    for (day, &close) in closes.iter().enumerate() {
        d.add_bar(&flat_bar(day, close)).unwrap();
    }
    assert_eq!(d.active_peaks().len(), 1);

    // Breakout well past the supersede margin at bar 12.
    let breakout_bar = Bar {
        date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(12),
        open: 105.0,
        high: 106.5,
        low: 104.0,
        close: 106.0,
        volume: 3000.0,
    };
    let info = d.add_bar(&breakout_bar).unwrap().unwrap();

    // Ten forward bars; one low (99) dips under the broken peak price.
    let lows = [101.0, 101.0, 102.0, 99.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0];
    for (offset, &low) in lows.iter().enumerate() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
                + chrono::Duration::days(13 + offset as i64),
            open: low + 1.0,
            high: low + 3.0,
            low,
            close: low + 2.0,
            volume: 1000.0,
        };
        d.add_bar(&bar).unwrap();
    }

    let calc = FeatureCalculator::default();
    let breakout = calc.enrich(d.bars(), &info, "SCEN", Some(&d));
    assert!((breakout.stability_score - 90.0).abs() < 1e-12);
}

#[test]
fn repeated_breakouts_build_momentum() {
    let mut d = detector();
    let mut closes = vec![90.0; 21];
    closes[5] = 100.0;
    // Shallow re-breaks of the retained peak.
    closes[12] = 101.0;
    closes[16] = 101.2;
    closes[20] = 101.4;

    let mut infos = Vec::new();
    for (day, &close) in closes.iter().enumerate() {
        if let Some(info) = d.add_bar(&flat_bar(day, close)).unwrap() {
            infos.push(info);
        }
    }

    let indices: Vec<usize> = infos.iter().map(|i| i.index).collect();
    assert_eq!(indices, vec![12, 16, 20]);
    assert_eq!(d.recent_breakout_count(20), 3);

    let calc = FeatureCalculator::default();
    let mut breakout = calc.enrich(d.bars(), &infos[2], "SCEN", Some(&d));
    assert_eq!(breakout.recent_breakout_count, 3);

    let scorer = QualityScorer::default();
    scorer.score(&mut breakout);
    let breakdown = scorer.breakdown(&breakout);
    let momentum = breakdown
        .bonuses
        .iter()
        .find(|b| b.name == "momentum_bonus")
        .unwrap();
    assert_eq!(momentum.multiplier, 1.20);
}
