//! # Destination choice with capped attractions
//!
//! Five zones, fixed trip productions and per-zone attraction caps, from
//! C. Schiller, "Auslastungsabhängige Attraktivitäten in makroskopischen
//! Zielwahlmodellen", Straßenverkehrstechnik 5.2010.
//!
//! With fixed attraction targets the destination preferences in the weight
//! matrix would be flattened. Capping attractions with a `[0, max]` band only
//! diverts trips away from zones that would otherwise be overloaded.
//!
//! Per-iteration gaps are logged at trace level:
//!
//! ```bash
//! cargo run --example schiller
//! ```

use bandfit_core::{BandwidthFitter, Matrix};
use tracing::Level;

fn print_matrix(title: &str, m: &Matrix) {
    println!("{title}");
    for row in m.rows() {
        let cells: Vec<String> = row.iter().map(|x| format!("{x:8.3}")).collect();
        println!("  [{}]", cells.join(" "));
    }
}

fn print_vec(title: &str, v: &[f64]) {
    let cells: Vec<String> = v.iter().map(|x| format!("{x:8.3}")).collect();
    println!("{title:<10}[{}]", cells.join(" "));
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::TRACE).with_target(false).init();

    let weights = Matrix::from([
        [0.00, 0.99, 1.00, 0.98, 0.98],
        [0.99, 0.00, 0.96, 0.92, 0.73],
        [1.00, 0.96, 0.00, 0.99, 0.93],
        [0.98, 0.92, 0.99, 0.00, 0.88],
        [0.98, 0.73, 0.93, 0.88, 0.00],
    ]);
    let production = [50.0, 100.0, 50.0, 100.0, 200.0];
    let attraction_min = [0.0; 5];
    let attraction_max = [150.0, 60.0, 175.0, 175.0, 100.0];

    print_matrix("weights:", &weights);
    print_vec("r_min:", &production);
    print_vec("r_max:", &production);
    print_vec("c_min:", &attraction_min);
    print_vec("c_max:", &attraction_max);

    let fitter = BandwidthFitter::new(0.001, 0.00001, 25);
    let outcome = match fitter.fit(weights, &production, &production, &attraction_min, &attraction_max)
    {
        Ok(o) => o,
        Err(e) => {
            eprintln!("fit rejected: {e}");
            std::process::exit(1);
        }
    };

    println!();
    print_matrix("trips:", &outcome.matrix);
    print_vec("rows:", &outcome.matrix.row_sums());
    print_vec("cols:", &outcome.matrix.col_sums());

    let r = &outcome.report;
    println!();
    println!("stop:            {:?}", r.stop);
    println!("iterations:      {}", r.iterations);
    println!("gap:             {:.6e}", r.gap);
    println!("gap improvement: {:.6e}", r.gap_improvement);
}
