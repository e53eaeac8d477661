//! The graph definition document sent to the agent.

use std::io::Write;

use mackerel_plugin_types::{title, GraphDef};

use crate::error::Result;

/// First line of a definition response.
pub const DEFINITION_HEADER: &str = "# mackerel-agent-plugin";

/// The definition as the agent sees it.
///
/// Graph keys are qualified with `prefix` (an empty key becomes the prefix
/// itself), and empty labels are replaced by the title-cased graph key or
/// metric name.
pub fn agent_definition(def: &GraphDef, prefix: Option<&str>) -> GraphDef {
    def.iter()
        .map(|(key, graph)| {
            let key = match prefix {
                Some(prefix) if key.is_empty() => prefix.to_string(),
                Some(prefix) => format!("{prefix}.{key}"),
                None => key.clone(),
            };

            let mut graph = graph.clone();
            if graph.label.is_empty() {
                graph.label = title(&key);
            }
            for metric in &mut graph.metrics {
                if metric.label.is_empty() {
                    metric.label = title(&metric.name);
                }
            }

            (key, graph)
        })
        .collect::<std::collections::BTreeMap<_, _>>()
        .into()
}

/// Write the header line followed by the JSON document on one line.
pub fn write_definitions<W: Write>(w: &mut W, def: &GraphDef, prefix: Option<&str>) -> Result<()> {
    let doc = agent_definition(def, prefix);
    writeln!(w, "{DEFINITION_HEADER}")?;
    serde_json::to_writer(&mut *w, &doc)?;
    writeln!(w)?;
    Ok(())
}
