//! Integration tests for CPW sizing and edge coupler placement.

use lnoi400_pdk::components::frame::ChipFrame;
use lnoi400_pdk::components::waveguides::DoubleLinearInverseTaper;
use lnoi400_pdk::components::Generator;
use lnoi400_pdk::error::ParameterError;
use lnoi400_pdk::layout::Port;
use lnoi400_pdk::technology::{Technology, TechnologyParams};
use lnoi400_pdk::utils::cpw::{CpwSpec, IMPEDANCE_TOLERANCE};
use lnoi400_pdk::utils::{cpw_spec, place_edge_couplers, ChipEdge, CpwTarget, EdgeSpacing, Side};

fn tech() -> Technology {
    TechnologyParams::default().build().unwrap()
}

// =============================================================================
// CPW Sizing
// =============================================================================

#[test]
fn test_cpw_meets_target_within_tolerance() {
    let tech = tech();
    for impedance in [40.0, 50.0, 65.0, 80.0, 100.0, 120.0] {
        let spec = cpw_spec(&CpwTarget::new(impedance, 10.0, 180.0), &tech)
            .unwrap_or_else(|e| panic!("{impedance} Ω: {e}"));
        assert!(
            (spec.impedance - impedance).abs() <= IMPEDANCE_TOLERANCE * impedance,
            "{impedance} Ω sized to {}",
            spec.impedance
        );
        let check = CpwSpec::from_dimensions(10.0, spec.gap, 180.0, "TL", &tech).unwrap();
        assert!((check.impedance - spec.impedance).abs() < 1e-9);
    }
}

#[test]
fn test_cpw_gap_grows_with_impedance() {
    let tech = tech();
    let gaps: Vec<f64> = [45.0, 60.0, 90.0]
        .iter()
        .map(|&z| cpw_spec(&CpwTarget::new(z, 10.0, 180.0), &tech).unwrap().gap)
        .collect();
    assert!(gaps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_cpw_substrate_lowers_impedance() {
    let plain = CpwSpec::from_dimensions(10.0, 5.0, 180.0, "TL", &tech()).unwrap();
    let with_si = CpwSpec::from_dimensions(
        10.0,
        5.0,
        180.0,
        "TL",
        &TechnologyParams {
            include_substrate: true,
            ..TechnologyParams::default()
        }
        .build()
        .unwrap(),
    )
    .unwrap();
    assert!(with_si.impedance < plain.impedance);
}

#[test]
fn test_cpw_outside_range_is_unrealizable() {
    let tech = tech();
    for impedance in [5.0, 1000.0] {
        let err = cpw_spec(&CpwTarget::new(impedance, 10.0, 180.0), &tech).unwrap_err();
        assert!(matches!(err, ParameterError::Unrealizable { .. }));
    }
}

#[test]
fn test_cpw_unknown_layer() {
    let target = CpwTarget {
        layer: "M9".into(),
        ..CpwTarget::new(50.0, 10.0, 180.0)
    };
    assert!(matches!(
        cpw_spec(&target, &tech()),
        Err(ParameterError::UnknownLayer { .. })
    ));
}

// =============================================================================
// Edge Coupler Placement
// =============================================================================

fn coupler_ports(n: usize, tech: &Technology) -> Vec<Port> {
    let coupler = DoubleLinearInverseTaper::default().build(tech).unwrap();
    let facet = coupler.port("P0").unwrap();
    (0..n)
        .map(|i| {
            let mut port = facet.clone();
            port.name = format!("F{i}");
            port
        })
        .collect()
}

#[test]
fn test_placement_succeeds_iff_couplers_fit() {
    let tech = tech();
    let edge = ChipEdge {
        origin: lnoi400_pdk::layout::Point::new(0.0, 0.0),
        length: 1000.0,
        direction: 90.0,
    };
    let footprint = 10.0;
    for pitch in [10.0, 50.0, 127.0, 250.0] {
        for start_offset in [0.0, 100.0] {
            for n in 0..12 {
                let spacing = EdgeSpacing { pitch, start_offset };
                let ports = coupler_ports(n, &tech);
                let result = place_edge_couplers(&ports, &edge, &spacing, footprint);
                #[allow(clippy::cast_precision_loss)]
                let fits = n == 0 || start_offset + (n - 1) as f64 * pitch + footprint <= edge.length;
                match result {
                    Ok(placement) => {
                        assert!(fits, "n={n} pitch={pitch} offset={start_offset}");
                        assert_eq!(placement.sites.len(), n);
                    }
                    Err(ParameterError::InsufficientEdge { count, .. }) => {
                        assert!(!fits, "n={n} pitch={pitch} offset={start_offset}");
                        assert_eq!(count, n);
                    }
                    Err(e) => panic!("unexpected error {e}"),
                }
            }
        }
    }
}

#[test]
fn test_placement_on_frame_edge() {
    let tech = tech();
    let frame = ChipFrame::default();
    let (x, y) = frame.die_size().unwrap();
    let edge = ChipEdge::of_frame(x, y, Side::Left);
    assert!((edge.length - (y - 100.0)).abs() < 1e-9);

    let spacing = EdgeSpacing {
        pitch: 127.0,
        start_offset: 500.0,
    };
    let placement = place_edge_couplers(&coupler_ports(4, &tech), &edge, &spacing, 20.0).unwrap();
    for site in &placement.sites {
        assert!((site.position.x - 50.0).abs() < 1e-9);
        // couplers on the left edge face into the chip
        assert!(site.orientation.abs() < 1e-9);
    }
    assert!(placement.sites[0].position.y > placement.sites[3].position.y);
}

#[test]
fn test_pitch_smaller_than_footprint() {
    let tech = tech();
    let edge = ChipEdge::of_frame(10100.0, 5050.0, Side::Bottom);
    let spacing = EdgeSpacing {
        pitch: 5.0,
        start_offset: 0.0,
    };
    let err = place_edge_couplers(&coupler_ports(2, &tech), &edge, &spacing, 10.0).unwrap_err();
    assert!(matches!(err, ParameterError::Constraint { .. }));
}
