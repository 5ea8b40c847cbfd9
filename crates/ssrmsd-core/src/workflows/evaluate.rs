use crate::core::geometry::alignment::AlignmentMode;
use crate::core::io::traits::Frame;
use crate::core::templates::{LengthUnits, TemplateRegistry};
use crate::engine::colvar::SecondaryStructureColvar;
use crate::engine::config::ColvarConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateConfig {
    /// Built-in motif name or keyword, or the name of a template in `template_file`.
    pub template: String,
    pub template_file: Option<PathBuf>,
    pub units: LengthUnits,
    /// For distance-matrix alignment without an explicit lower bound, ignore reference
    /// pairs no farther apart than the template's bond length.
    pub exclude_bonded_pairs: bool,
    pub colvar: ColvarConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub frame: usize,
    /// One value per component, in component order.
    pub values: Vec<f64>,
    pub skipped_windows: usize,
    pub degenerate_windows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub template: String,
    pub windows: usize,
    pub components: Vec<&'static str>,
    pub frames: Vec<FrameResult>,
}

impl EvaluationReport {
    /// Writes one CSV row per frame: `frame,<component>...`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec!["frame"];
        header.extend(self.components.iter().copied());
        csv.write_record(&header)?;

        for frame in &self.frames {
            let mut record = vec![frame.frame.to_string()];
            record.extend(frame.values.iter().map(|v| format!("{v:.8}")));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Resolves the template, builds the collective variable and evaluates every frame
/// in order. The neighbor-list state, if any, carries over from frame to frame.
#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(
    config: &EvaluateConfig,
    frames: &[Frame],
    reporter: &ProgressReporter,
) -> Result<EvaluationReport, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Setup" });

    let registry = match &config.template_file {
        Some(path) => TemplateRegistry::load(path)?,
        None => TemplateRegistry::builtin(),
    };
    let template = registry.get(&config.template, config.units)?;

    let mut colvar_config = config.colvar.clone();
    if config.exclude_bonded_pairs {
        if let (AlignmentMode::DistanceMatrix { lower_bound: None }, Some(bond_length)) =
            (colvar_config.alignment, template.bond_length())
        {
            colvar_config.alignment = AlignmentMode::DistanceMatrix {
                lower_bound: Some(bond_length),
            };
        }
    }

    let template_name = template.name().to_string();
    let mut colvar = SecondaryStructureColvar::new(template, colvar_config)?;
    let components = colvar.component_names();
    reporter.report(Progress::Message(format!(
        "Template '{}' covers {} window(s)",
        template_name,
        colvar.windows().len()
    )));
    reporter.report(Progress::PhaseFinish);

    info!(
        template = %template_name,
        frames = frames.len(),
        "Evaluating trajectory"
    );
    reporter.report(Progress::FramesStart {
        total: frames.len() as u64,
    });

    let mut results = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let output = colvar.evaluate(&frame.positions, frame.cell.as_ref())?;
        results.push(FrameResult {
            frame: index,
            values: output.components.iter().map(|c| c.value).collect(),
            skipped_windows: output.skipped_windows(),
            degenerate_windows: output.degenerate_windows,
        });
        reporter.report(Progress::FrameEvaluated { frame: index });
    }
    reporter.report(Progress::FramesFinish);

    let degenerate: usize = results.iter().map(|r| r.degenerate_windows).sum();
    info!(
        frames = results.len(),
        degenerate_windows = degenerate,
        "Trajectory evaluated"
    );

    Ok(EvaluationReport {
        template: template_name,
        windows: colvar.windows().len(),
        components,
        frames: results,
    })
}
