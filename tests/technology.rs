//! Integration tests for the technology builder and the default slot.

use std::sync::Arc;

use lnoi400_pdk::technology::extrusion::overlapping_rules;
use lnoi400_pdk::technology::{
    default_technology, layers, lnoi400, with_technology, PortKind, TechnologyParams,
};

fn parameter_sets() -> Vec<TechnologyParams> {
    let mut sets = Vec::new();
    for include_substrate in [false, true] {
        for include_top_opening in [false, true] {
            for cladding_thickness in [0.0, 0.5, 3.0] {
                for (ln_thickness, slab_thickness) in [(0.4, 0.2), (0.6, 0.0), (0.3, 0.29)] {
                    sets.push(TechnologyParams {
                        ln_thickness,
                        slab_thickness,
                        cladding_thickness,
                        include_substrate,
                        include_top_opening,
                        ..TechnologyParams::default()
                    });
                }
            }
        }
    }
    sets
}

// =============================================================================
// Extrusion Rules
// =============================================================================

#[test]
fn test_no_overlapping_extrusions() {
    for params in parameter_sets() {
        let tech = lnoi400(&params).expect("valid parameters");
        assert!(
            overlapping_rules(tech.extrusion_rules()).is_empty(),
            "overlap for {params:?}"
        );
    }
}

#[test]
fn test_extrusions_use_known_materials_and_layers() {
    for params in parameter_sets() {
        let tech = lnoi400(&params).unwrap();
        for rule in tech.extrusion_rules() {
            assert!(tech.material(&rule.material).is_some(), "{}", rule.material);
            for layer in rule.mask.layers() {
                assert!(tech.layer(layer).is_some(), "{layer}");
            }
            assert!(rule.z_min <= rule.z_max);
        }
    }
}

#[test]
fn test_metal_sits_on_separation_oxide() {
    let params = TechnologyParams {
        tl_separation: 2.0,
        tl_thickness: 1.5,
        ..TechnologyParams::default()
    };
    let tech = params.build().unwrap();
    let metal = tech
        .extrusion_rules()
        .iter()
        .find(|r| r.mask.draws(layers::TL))
        .unwrap();
    assert!((metal.z_min - 2.4).abs() < 1e-12);
    assert!((metal.z_max - 3.9).abs() < 1e-12);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_negative_cladding_is_rejected() {
    let params = TechnologyParams {
        cladding_thickness: -0.1,
        ..TechnologyParams::default()
    };
    let err = params.build().unwrap_err();
    assert_eq!(err.parameter, "cladding_thickness");
    assert!(err.to_string().contains("cladding_thickness"));
}

#[test]
fn test_every_parameter_is_range_checked() {
    let cases: [(&str, fn(&mut TechnologyParams)); 7] = [
        ("ln_thickness", |p| p.ln_thickness = 0.0),
        ("slab_thickness", |p| p.slab_thickness = -0.1),
        ("sidewall_angle", |p| p.sidewall_angle = 45.0),
        ("box_thickness", |p| p.box_thickness = 25.0),
        ("tl_thickness", |p| p.tl_thickness = f64::INFINITY),
        ("tl_separation", |p| p.tl_separation = 11.0),
        ("cladding_thickness", |p| p.cladding_thickness = f64::NAN),
    ];
    for (name, mutate) in cases {
        let mut params = TechnologyParams::default();
        mutate(&mut params);
        assert_eq!(params.validate().unwrap_err().parameter, name);
    }
}

// =============================================================================
// Port Specifications
// =============================================================================

#[test]
fn test_standard_port_specs() {
    let tech = TechnologyParams::default().build().unwrap();
    let names: Vec<&str> = tech.port_specs().keys().map(String::as_str).collect();
    assert_eq!(names, ["RWG1000", "RWG3000", "SWG250", "UniCPW", "UniCPW-EO"]);
    assert_eq!(tech.port_spec("UniCPW").unwrap().kind, PortKind::Electrical);
    assert_eq!(tech.port_spec("SWG250").unwrap().num_modes, 1);
}

#[test]
fn test_cpw_specs_follow_the_stack() {
    let base = TechnologyParams::default().build().unwrap();
    let open = TechnologyParams {
        include_top_opening: true,
        ..TechnologyParams::default()
    }
    .build()
    .unwrap();
    let n_base = base.port_spec("UniCPW").unwrap().target_neff;
    let n_open = open.port_spec("UniCPW").unwrap().target_neff;
    // air above the metal lowers the effective index
    assert!(n_open < n_base);
}

#[test]
fn test_version_tracks_crate() {
    let tech = TechnologyParams::default().build().unwrap();
    assert_eq!(tech.version(), env!("CARGO_PKG_VERSION"));
    assert_eq!(tech.name(), "LNOI400");
}

// =============================================================================
// Default Technology
// =============================================================================

#[test]
fn test_scoped_technology_override() {
    let thick = Arc::new(
        TechnologyParams {
            ln_thickness: 0.6,
            ..TechnologyParams::default()
        }
        .build()
        .unwrap(),
    );
    let inside = with_technology(Arc::clone(&thick), || {
        default_technology().parameters().ln_thickness
    });
    assert!((inside - 0.6).abs() < f64::EPSILON);
    assert!((default_technology().parameters().ln_thickness - 0.4).abs() < f64::EPSILON);
}
