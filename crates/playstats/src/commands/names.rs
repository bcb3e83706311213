//! Display-name override handlers.

use serde::Serialize;
use tabled::Tabled;

use playstats_core::{DashboardSession, MappingKind, NameMapping};

use crate::cli::{GlobalOpts, NamesArgs, NamesCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Raw id")]
    raw_id: String,
    #[tabled(rename = "Label")]
    label: String,
}

#[derive(Serialize)]
struct Change<'a> {
    kind: MappingKind,
    raw_id: &'a str,
    label: &'a str,
    cleared: bool,
}

pub fn handle(
    session: &mut DashboardSession,
    args: NamesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NamesCommand::List { kind } => {
            let kinds = kind.map_or_else(|| MappingKind::ALL.to_vec(), |k| vec![k.into()]);
            let mappings: Vec<NameMapping> = kinds
                .into_iter()
                .flat_map(|k| session.names().all_mappings(k))
                .collect();

            let out = output::render_list(
                global.output,
                mappings.as_slice(),
                |m: &NameMapping| MappingRow {
                    kind: m.kind.to_string(),
                    raw_id: m.raw_id.clone(),
                    label: m.label.clone(),
                },
                |m| format!("{}\t{}\t{}", m.kind, m.raw_id, m.label),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        NamesCommand::Set {
            kind,
            raw_id,
            label,
        } => apply(session, kind.into(), &raw_id, &label, global),
        NamesCommand::Clear { kind, raw_id } => apply(session, kind.into(), &raw_id, "", global),
    }
}

fn apply(
    session: &mut DashboardSession,
    kind: MappingKind,
    raw_id: &str,
    label: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let names = session.names_mut();
    names.set_mapping(kind, raw_id, label);
    if let Some(err) = names.last_write_error() {
        return Err(err.clone().into());
    }

    let change = Change {
        kind,
        raw_id,
        label: names.resolve_label(kind, raw_id),
        cleared: label.trim().is_empty(),
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &change,
        |c| {
            if c.cleared {
                format!("Cleared {} label for {}", c.kind, output::dim(c.raw_id, color))
            } else {
                format!(
                    "{} {} -> {}",
                    c.kind,
                    output::dim(c.raw_id, color),
                    output::label(c.label, color)
                )
            }
        },
        |c| c.label.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
