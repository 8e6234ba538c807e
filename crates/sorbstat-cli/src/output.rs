use sorbstat::core::models::ensemble::Ensemble;
use sorbstat::core::stats::moments::Estimate;
use sorbstat::engine::config::SimulationParameters;
use sorbstat::engine::report::Report;
use sorbstat::engine::sorbates::SorbateGlobal;

fn pm(estimate: Estimate, precision: usize) -> String {
    format!("{:.*}", precision, estimate)
}

fn pm_sci(estimate: Estimate, precision: usize) -> String {
    format!(
        "{:.*e} +- {:.*e}",
        precision, estimate.value, precision, estimate.error
    )
}

fn positive(estimate: &Estimate) -> bool {
    estimate.value > 0.0 && estimate.is_finite()
}

/// Renders the `OUTPUT:` averages block for one report.
///
/// Lines for quantities that are zero, undefined, or irrelevant to the
/// ensemble are left out. The single-sorbate sorption lines appear only when
/// at most one species is declared; with more, a per-species block follows.
pub fn format_report(report: &Report, params: &SimulationParameters, precision: usize) -> Vec<String> {
    let p = precision;
    let mut lines = Vec::new();
    let stats = &report.node_stats;

    if stats.boltzmann_factor.value > 0.0 {
        lines.push(format!("OUTPUT: BF = {}", pm(stats.boltzmann_factor, p)));
    }

    let ar = &stats.acceptance;
    if ar.overall > 0.0 {
        let mut line = format!(
            "OUTPUT: AR = {:.p$} ({:.p$} I/ {:.p$} R/ {:.p$} D",
            ar.overall, ar.insert, ar.remove, ar.displace
        );
        for (rate, tag) in [
            (ar.adiabatic, "A"),
            (ar.spin_flip, "S"),
            (ar.volume, "V"),
            (ar.ptemp, "PT"),
        ] {
            if rate != 0.0 {
                line.push_str(&format!("/ {:.p$} {}", rate, tag));
            }
        }
        line.push(')');
        lines.push(line);
    }

    if stats.cavity_bias_probability.value > 0.0 {
        lines.push(format!(
            "OUTPUT: Cavity bias probability = {}",
            pm(stats.cavity_bias_probability, p)
        ));
    }

    lines.push(format!("OUTPUT: potential energy = {} K", pm(report.energy, p)));
    if report.coulombic_energy.value != 0.0 {
        lines.push(format!(
            "OUTPUT: electrostatic energy = {} K",
            pm(report.coulombic_energy, p)
        ));
    }
    if report.rd_energy.value != 0.0 {
        lines.push(format!(
            "OUTPUT: repulsion/dispersion energy = {} K",
            pm(report.rd_energy, p)
        ));
    }
    if report.polarization_energy.value != 0.0 {
        lines.push(format!(
            "OUTPUT: polarization energy = {} K (iterations = {})",
            pm(report.polarization_energy, p),
            pm(stats.polarization_iterations, 1)
        ));
    }
    if report.vdw_energy.value != 0.0 {
        lines.push(format!("OUTPUT: vdw energy = {} K", pm(report.vdw_energy, p)));
    }
    if report.three_body_energy.value != 0.0 {
        lines.push(format!(
            "OUTPUT: three-body energy = {} K",
            pm(report.three_body_energy, p)
        ));
    }
    if report.kinetic_energy.value > 0.0 {
        lines.push(format!(
            "OUTPUT: kinetic energy = {} K",
            pm(report.kinetic_energy, p)
        ));
        lines.push(format!(
            "OUTPUT: kinetic temperature = {} K",
            pm(report.temperature, p)
        ));
    }

    lines.push(format!("OUTPUT: N = {} molecules", pm(report.n, p)));

    let derived = &report.derived;
    if params.species.len() <= 1 {
        lines.push(format!("OUTPUT: density = {} g/cm^3", pm(report.density, p)));
        if let Some(pore) = derived.pore_density {
            if pore.value != 0.0 && !params.ensemble.is_isobaric() {
                lines.push(format!("OUTPUT: pore density = {} g/cm^3", pm(pore, p)));
            }
        }
        if let (Some(wt), Some(wt_me)) = (derived.percent_wt, derived.percent_wt_me) {
            if wt.value > 0.0 {
                lines.push(format!("OUTPUT: wt % = {} %", pm(wt, p)));
                lines.push(format!("OUTPUT: wt % (ME) = {} %", pm(wt_me, p)));
            }
        }
        if let Some(excess) = derived.excess_ratio {
            if excess.value > 0.0 {
                lines.push(format!(
                    "OUTPUT: excess adsorption ratio = {} mg/g",
                    pm(excess, p)
                ));
            }
        }
        if let Some(qst) = derived.qst {
            if qst > 0.0 && qst.is_finite() {
                lines.push(format!("OUTPUT: qst = {:.p$} kJ/mol", qst));
            }
        }
        if positive(&derived.compressibility) {
            lines.push(format!(
                "OUTPUT: compressibility = {} atm^-1",
                pm_sci(derived.compressibility, p)
            ));
            lines.push(format!(
                "OUTPUT: bulk modulus = {} GPa",
                pm(derived.bulk_modulus, p)
            ));
        }
    }

    if positive(&derived.heat_capacity) {
        lines.push(format!(
            "OUTPUT: heat capacity = {} kJ/mol K",
            pm(derived.heat_capacity, p)
        ));
    }

    if params.ensemble.is_isobaric() || params.ensemble == Ensemble::Replay {
        lines.push(format!("OUTPUT: volume = {} A^3", pm(report.volume, p)));
    }

    if report.spin_ratio.value > 0.0 {
        lines.push(format!(
            "OUTPUT: ortho spin ratio = {} %",
            pm(report.spin_ratio.scaled(100.0), p)
        ));
    }

    if params.species.len() > 1 {
        for (species, sorbate) in params.species.iter().zip(&report.sorbates) {
            push_sorbate_lines(&mut lines, sorbate, species.mass, p);
        }
    }

    lines
}

fn push_sorbate_lines(lines: &mut Vec<String>, sorbate: &SorbateGlobal, mass: f64, p: usize) {
    let id = &sorbate.id;
    lines.push(format!("OUTPUT: Stats for {}", id));
    lines.push(format!("    Average_N({})= {}", id, pm(sorbate.n, p)));
    lines.push(format!(
        "    Sorbed_Mass({})= {} g/mol",
        id,
        pm(sorbate.n.scaled(mass), p)
    ));
    if let Some(density) = sorbate.density {
        lines.push(format!("    density({})= {} g/cm^3", id, pm(density, p)));
    }
    if let Some(pore) = sorbate.pore_density {
        lines.push(format!("    pore_density({})= {} g/cm^3", id, pm(pore, p)));
    }
    if let Some(excess) = sorbate.excess_ratio {
        lines.push(format!("    excess_ratio({})= {} mg/g", id, pm(excess, p)));
    }
    if let (Some(wt), Some(wt_me)) = (sorbate.percent_wt, sorbate.percent_wt_me) {
        lines.push(format!("    wt_%({})= {} %", id, pm(wt, p)));
        lines.push(format!("    wt_%({})(ME)= {} %", id, pm(wt_me, p)));
    }
    if let Some(selectivity) = sorbate.selectivity {
        lines.push(format!("    Selectivity({})= {}", id, pm(selectivity, 4)));
    }
}
