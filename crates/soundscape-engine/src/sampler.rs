//! The sampling dispatch.
//!
//! Every distribution descriptor is evaluated through [`sample`], which
//! takes the generation's single seeded generator and the source catalog
//! (for lazy `choose_file` expansion). Descriptors are re-validated here
//! so a scene assembled without going through validation still cannot
//! sample inconsistent parameters.

use rand::Rng;
use rand_distr::StandardNormal;
use rand_pcg::Pcg32;

use soundscape_spec::{DistributionError, DistributionSpec, ParamValue};

use crate::source::SourceCatalog;

/// Draw budget for rejection sampling of `truncnorm`.
///
/// A window this hard to hit (acceptance below ~0.1%) means the
/// truncation bounds sit far out in the tail; failing loudly beats
/// silently clipping, which would bias the mean.
pub const MAX_REJECTION_DRAWS: u32 = 1000;

/// Samples a concrete value from a distribution descriptor.
///
/// # Arguments
/// * `spec` - The descriptor to sample
/// * `rng` - The generation's seeded generator
/// * `catalog` - Source catalog, used only by `choose_file`
///
/// # Errors
/// Returns a [`DistributionError`] for inconsistent parameters, an
/// unlistable or empty `choose_file` folder, or an exhausted rejection
/// budget.
pub fn sample(
    spec: &DistributionSpec,
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> Result<ParamValue, DistributionError> {
    spec.validate()?;

    match spec {
        DistributionSpec::Const { value } => Ok(value.clone()),

        DistributionSpec::Choose { options } => {
            let index = rng.gen_range(0..options.len());
            Ok(options[index].clone())
        }

        DistributionSpec::ChooseWeighted { options, weights } => {
            let total: f64 = weights.iter().sum();
            let mut draw = rng.gen::<f64>() * total;
            for (option, &weight) in options.iter().zip(weights.iter()) {
                if draw < weight {
                    return Ok(option.clone());
                }
                draw -= weight;
            }
            // Floating-point residue can step past the last positive
            // weight; the draw belongs to the tail option.
            Ok(options
                .last()
                .expect("validated non-empty option list")
                .clone())
        }

        DistributionSpec::ChooseFile { folder } => {
            let files = catalog
                .list(folder)
                .map_err(|e| DistributionError::FolderUnreadable {
                    folder: folder.clone(),
                    message: e.to_string(),
                })?;
            if files.is_empty() {
                return Err(DistributionError::EmptyFolder {
                    folder: folder.clone(),
                });
            }
            let index = rng.gen_range(0..files.len());
            Ok(ParamValue::Text(files[index].clone()))
        }

        DistributionSpec::Uniform { min, max } => {
            if min == max {
                Ok(ParamValue::Number(*min))
            } else {
                Ok(ParamValue::Number(rng.gen_range(*min..=*max)))
            }
        }

        DistributionSpec::Normal { mean, std } => {
            let z: f64 = rng.sample(StandardNormal);
            Ok(ParamValue::Number(mean + std * z))
        }

        DistributionSpec::TruncNorm {
            mean,
            std,
            min,
            max,
        } => {
            for _ in 0..MAX_REJECTION_DRAWS {
                let z: f64 = rng.sample(StandardNormal);
                let value = mean + std * z;
                if value >= *min && value <= *max {
                    return Ok(ParamValue::Number(value));
                }
            }
            Err(DistributionError::Unsamplable {
                kind: spec.kind(),
                attempts: MAX_REJECTION_DRAWS,
            })
        }
    }
}

/// Samples a descriptor and requires a numeric result.
pub fn sample_f64(
    spec: &DistributionSpec,
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> Result<f64, DistributionError> {
    let value = sample(spec, rng, catalog)?;
    value
        .as_f64()
        .ok_or_else(|| DistributionError::WrongValueType {
            expected: "number",
            found: value.type_name(),
        })
}

/// Samples a descriptor and requires a text result.
pub fn sample_text(
    spec: &DistributionSpec,
    rng: &mut Pcg32,
    catalog: &dyn SourceCatalog,
) -> Result<String, DistributionError> {
    let value = sample(spec, rng, catalog)?;
    match value {
        ParamValue::Text(s) => Ok(s),
        ParamValue::Number(_) => Err(DistributionError::WrongValueType {
            expected: "text",
            found: "number",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use crate::source::MemoryCatalog;

    fn empty_catalog() -> MemoryCatalog {
        MemoryCatalog::new()
    }

    #[test]
    fn test_const_bypasses_randomness() {
        let mut rng = create_rng(1);
        let catalog = empty_catalog();
        let spec = DistributionSpec::constant(2.5);
        for _ in 0..5 {
            assert_eq!(
                sample_f64(&spec, &mut rng, &catalog).unwrap(),
                2.5
            );
        }
    }

    #[test]
    fn test_choose_single_option_always_returned() {
        let mut rng = create_rng(7);
        let catalog = empty_catalog();
        let spec = DistributionSpec::choose(["x"]);
        for _ in 0..20 {
            assert_eq!(sample_text(&spec, &mut rng, &catalog).unwrap(), "x");
        }
    }

    #[test]
    fn test_uniform_stays_in_bounds() {
        let mut rng = create_rng(42);
        let catalog = empty_catalog();
        let spec = DistributionSpec::uniform(2.0, 5.0);
        for _ in 0..1000 {
            let v = sample_f64(&spec, &mut rng, &catalog).unwrap();
            assert!((2.0..=5.0).contains(&v), "out of bounds: {}", v);
        }
    }

    #[test]
    fn test_uniform_degenerate_bounds() {
        let mut rng = create_rng(42);
        let catalog = empty_catalog();
        let spec = DistributionSpec::uniform(3.0, 3.0);
        assert_eq!(sample_f64(&spec, &mut rng, &catalog).unwrap(), 3.0);
    }

    #[test]
    fn test_truncnorm_stays_in_bounds_never_clips() {
        let mut rng = create_rng(9);
        let catalog = empty_catalog();
        // Window away from the mean so naive clipping would be obvious:
        // clipped draws would pile up exactly on 4.0.
        let spec = DistributionSpec::truncnorm(0.0, 2.0, 4.0, 6.0);
        let mut on_boundary = 0;
        for _ in 0..200 {
            let v = sample_f64(&spec, &mut rng, &catalog).unwrap();
            assert!((4.0..=6.0).contains(&v), "out of bounds: {}", v);
            if v == 4.0 || v == 6.0 {
                on_boundary += 1;
            }
        }
        assert_eq!(on_boundary, 0, "draws must not sit exactly on the bounds");
    }

    #[test]
    fn test_truncnorm_unreachable_window_fails() {
        let mut rng = create_rng(9);
        let catalog = empty_catalog();
        // ~40 sigma out: rejection budget must trip, not spin forever.
        let spec = DistributionSpec::truncnorm(0.0, 1.0, 40.0, 41.0);
        let err = sample(&spec, &mut rng, &catalog).unwrap_err();
        assert!(matches!(err, DistributionError::Unsamplable { .. }));
    }

    #[test]
    fn test_normal_deterministic_per_seed() {
        let catalog = empty_catalog();
        let spec = DistributionSpec::normal(10.0, 2.0);

        let mut rng1 = create_rng(5);
        let mut rng2 = create_rng(5);
        let a: Vec<f64> = (0..10)
            .map(|_| sample_f64(&spec, &mut rng1, &catalog).unwrap())
            .collect();
        let b: Vec<f64> = (0..10)
            .map(|_| sample_f64(&spec, &mut rng2, &catalog).unwrap())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_choose_weighted_respects_zero_weight() {
        let mut rng = create_rng(3);
        let catalog = empty_catalog();
        let spec = DistributionSpec::ChooseWeighted {
            options: vec!["never".into(), "always".into()],
            weights: vec![0.0, 1.0],
        };
        for _ in 0..100 {
            assert_eq!(sample_text(&spec, &mut rng, &catalog).unwrap(), "always");
        }
    }

    #[test]
    fn test_choose_file_lazy_expansion() {
        let mut rng = create_rng(11);
        let mut catalog = MemoryCatalog::new();
        catalog.add_file("fg/siren", "fg/siren/a.wav", 2.0);

        let spec = DistributionSpec::choose_file("fg/siren");
        assert_eq!(
            sample_text(&spec, &mut rng, &catalog).unwrap(),
            "fg/siren/a.wav"
        );

        // A file added after the first draw is visible on the next one:
        // expansion happens per sample call.
        catalog.add_file("fg/siren", "fg/siren/b.wav", 2.0);
        let mut seen_b = false;
        for _ in 0..50 {
            if sample_text(&spec, &mut rng, &catalog).unwrap() == "fg/siren/b.wav" {
                seen_b = true;
                break;
            }
        }
        assert!(seen_b);
    }

    #[test]
    fn test_choose_file_empty_folder() {
        let mut rng = create_rng(11);
        let mut catalog = MemoryCatalog::new();
        catalog.add_folder("fg/empty");

        let spec = DistributionSpec::choose_file("fg/empty");
        let err = sample(&spec, &mut rng, &catalog).unwrap_err();
        assert!(matches!(err, DistributionError::EmptyFolder { .. }));
    }

    #[test]
    fn test_choose_file_missing_folder() {
        let mut rng = create_rng(11);
        let catalog = empty_catalog();
        let spec = DistributionSpec::choose_file("fg/missing");
        let err = sample(&spec, &mut rng, &catalog).unwrap_err();
        assert!(matches!(err, DistributionError::FolderUnreadable { .. }));
    }

    #[test]
    fn test_invalid_parameters_rejected_at_sample_time() {
        let mut rng = create_rng(1);
        let catalog = empty_catalog();
        let spec = DistributionSpec::uniform(5.0, 1.0);
        let err = sample(&spec, &mut rng, &catalog).unwrap_err();
        assert!(matches!(err, DistributionError::InvalidBounds { .. }));
    }

    #[test]
    fn test_wrong_value_type() {
        let mut rng = create_rng(1);
        let catalog = empty_catalog();

        let err = sample_f64(&DistributionSpec::constant("text"), &mut rng, &catalog).unwrap_err();
        assert!(matches!(err, DistributionError::WrongValueType { .. }));

        let err = sample_text(&DistributionSpec::constant(1.0), &mut rng, &catalog).unwrap_err();
        assert!(matches!(err, DistributionError::WrongValueType { .. }));
    }
}
