use crate::cli::{TemplatesArgs, TemplatesCommands};
use crate::error::Result;
use ssrmsd::core::templates::{LengthUnits, TemplateRegistry};
use std::io::Write;
use tracing::info;

pub fn run(args: TemplatesArgs) -> Result<()> {
    let registry = match &args.template_file {
        Some(path) => {
            info!("Loading templates from {:?}", path);
            TemplateRegistry::load(path)?
        }
        None => TemplateRegistry::builtin(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.command {
        TemplatesCommands::List => write_list(&registry, &mut out),
        TemplatesCommands::Show { name } => write_template(&registry, &name, &mut out),
    }
}

fn write_list<W: Write>(registry: &TemplateRegistry, out: &mut W) -> Result<()> {
    let summaries = registry.summaries();
    writeln!(
        out,
        "{:<22} {:<26} {:>8} {:>6}  {}",
        "NAME", "KEYWORD", "RESIDUES", "ATOMS", "DESCRIPTION"
    )?;
    for summary in &summaries {
        writeln!(
            out,
            "{:<22} {:<26} {:>8} {:>6}  {}",
            summary.name,
            summary.keyword.unwrap_or("-"),
            summary.atoms / summary.residue_atoms.max(1),
            summary.atoms,
            summary.description
        )?;
    }
    Ok(())
}

fn write_template<W: Write>(registry: &TemplateRegistry, name: &str, out: &mut W) -> Result<()> {
    let template = registry.get(name, LengthUnits::angstrom())?;
    writeln!(out, "# {}", template.name())?;
    writeln!(
        out,
        "# {} residues x {} atoms",
        template.residue_count(),
        template.residue_atoms()
    )?;
    if let Some(bond_length) = template.bond_length() {
        writeln!(out, "# bonded-pair bound: {:.3} A", bond_length)?;
    }
    writeln!(out, "{:>5} {:>10} {:>10} {:>10} {:>8}", "ATOM", "X", "Y", "Z", "WEIGHT")?;
    for (i, (position, weight)) in template
        .coordinates()
        .iter()
        .zip(template.weights())
        .enumerate()
    {
        writeln!(
            out,
            "{:>5} {:>10.4} {:>10.4} {:>10.4} {:>8.4}",
            i, position.x, position.y, position.z, weight
        )?;
    }
    Ok(())
}
