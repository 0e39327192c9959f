use crate::analysis::{ResponseSummary, StudySummary};
use std::fmt::Write;

/// Append the responses of one solved state.
fn render_response(output: &mut String, title: &str, response: &ResponseSummary) {
    writeln!(output, "{title}").expect("writing to string cannot fail");
    writeln!(output, "  total mass:            {:.4e} kg", response.total_mass)
        .expect("writing to string cannot fail");
    writeln!(
        output,
        "  max displacement:      {:.4e} m",
        response.max_displacement
    )
    .expect("writing to string cannot fail");
    writeln!(output, "  max |stress|:          {:.4e} Pa", response.max_stress)
        .expect("writing to string cannot fail");
    writeln!(
        output,
        "  max over-loading:      {:+.4e} Pa",
        response.max_over_loading
    )
    .expect("writing to string cannot fail");
    let radii: Vec<String> = response
        .radii
        .iter()
        .map(|radius| format!("{radius:.4}"))
        .collect();
    writeln!(output, "  radii [m]:             {}", radii.join(", "))
        .expect("writing to string cannot fail");
}

/// Render a textual summary of a study.
#[must_use]
pub fn render_summary(summary: &StudySummary) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "Planar truss with {} nodes and {} elements",
        summary.node_count, summary.element_count
    )
    .expect("writing to string cannot fail");

    render_response(&mut output, "Initial design", &summary.initial);

    match &summary.optimization {
        Some((report, optimized)) => {
            let variables: Vec<String> = report
                .x_optimal
                .iter()
                .map(|radius| format!("{radius:.4}"))
                .collect();
            writeln!(
                &mut output,
                "Sizing: {:?} after {} iterations ({})",
                report.status, report.iterations, report.message
            )
            .expect("writing to string cannot fail");
            writeln!(
                &mut output,
                "  group radii [m]:       {}",
                variables.join(", ")
            )
            .expect("writing to string cannot fail");
            writeln!(
                &mut output,
                "  mass reduction:        {:.1} %",
                100.0 * (1.0 - report.objective_value / report.initial_objective)
            )
            .expect("writing to string cannot fail");
            render_response(&mut output, "Optimized design", optimized);
        }
        None => output.push_str("Sizing: not requested\n"),
    }

    output
}
