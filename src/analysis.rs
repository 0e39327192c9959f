use trussopt::{AugmentedLagrangian, Error, Model, OptimizationReport, StudyDefinition};

/// Key responses of a solved model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSummary {
    /// Total mass in kilograms.
    pub total_mass: f64,
    /// Largest node displacement magnitude in metres.
    pub max_displacement: f64,
    /// Largest absolute axial stress in pascals.
    pub max_stress: f64,
    /// Largest `|σ| − σ_yield` over the elements in pascals.
    pub max_over_loading: f64,
    /// Radius of every element in metres, in element order.
    pub radii: Vec<f64>,
}

/// Summary of the results of a study.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    /// Number of nodes in the model.
    pub node_count: usize,
    /// Number of elements in the model.
    pub element_count: usize,
    /// Response with the radii given in the definition.
    pub initial: ResponseSummary,
    /// Sizing result, when the study requests one.
    pub optimization: Option<(OptimizationReport, ResponseSummary)>,
}

/// Solve the model and collect the responses reported to the user.
pub fn summarize(model: &Model) -> Result<ResponseSummary, Error> {
    let magnitudes = model.node_displacement_magnitudes()?;
    let stresses = model.element_stresses()?;
    let over_loading = model.over_loading()?;
    Ok(ResponseSummary {
        total_mass: model.total_mass(),
        max_displacement: magnitudes.max(),
        max_stress: stresses.amax(),
        max_over_loading: over_loading.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        radii: model.elements().map(|(_, element)| element.radius()).collect(),
    })
}

/// Build the model of `study`, analyse it and run the sizing when requested.
pub fn run_study(study: &StudyDefinition, optimize: bool) -> Result<StudySummary, Error> {
    let model = study.model.build()?;
    let initial = summarize(&model)?;
    let node_count = model.node_count();
    let element_count = model.element_count();

    let optimization = match (&study.optimization, optimize) {
        (Some(sizing), true) => {
            let driver = sizing.driver(model)?;
            let report = driver.optimize(
                &sizing.initial_radii,
                &AugmentedLagrangian::new(sizing.settings),
            )?;
            let optimized = summarize(&driver.model())?;
            Some((report, optimized))
        }
        _ => None,
    };

    Ok(StudySummary {
        node_count,
        element_count,
        initial,
        optimization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trussopt::benchmark::ten_bar_study;

    #[test]
    fn analysis_only_skips_sizing() {
        let summary = run_study(&ten_bar_study(), false).expect("benchmark analyses");
        assert_eq!(summary.node_count, 6);
        assert_eq!(summary.element_count, 10);
        assert!(summary.optimization.is_none());
        assert!(summary.initial.max_over_loading < 0.0);
        assert!(summary.initial.radii.iter().all(|radius| *radius == 0.5));
    }

    #[test]
    fn sizing_reduces_mass() {
        let summary = run_study(&ten_bar_study(), true).expect("benchmark sizes");
        let (report, optimized) = summary.optimization.expect("sizing requested");
        assert!(optimized.total_mass <= summary.initial.total_mass);
        assert!(
            (optimized.total_mass - report.objective_value).abs() < 1.0e-9 * optimized.total_mass
        );
        assert!(optimized.max_over_loading <= 1.0e-4 * 2.5e8);
    }
}
