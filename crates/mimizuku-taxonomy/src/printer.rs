//! クラス階層のテキスト表示

use crate::node::NodeId;
use crate::taxonomy::Taxonomy;
use std::fmt::{self, Write};

/// Renders a taxonomy as an indented class tree.
///
/// Each line is one equivalence class, its members joined with ` = `. A
/// class with several parents appears under each of them. ⊥ is printed
/// last, and only when some class is unsatisfiable.
pub struct TaxonomyPrinter<'t> {
    taxonomy: &'t Taxonomy,
    instances: bool,
    indent: usize,
}

impl<'t> TaxonomyPrinter<'t> {
    pub fn new(taxonomy: &'t Taxonomy) -> Self {
        Self {
            taxonomy,
            instances: false,
            indent: 2,
        }
    }

    /// List direct instances under their class
    pub fn with_instances(mut self, instances: bool) -> Self {
        self.instances = instances;
        self
    }

    pub fn print(&self) -> String {
        let mut out = String::new();
        // writing into a String never fails
        let _ = self.write_to(&mut out);
        out
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> fmt::Result {
        let taxonomy = self.taxonomy;
        self.write_node(out, taxonomy.top(), 0)?;

        let bottom = taxonomy.node(taxonomy.bottom());
        if bottom.equivalents().len() > 1 {
            self.write_line(out, taxonomy.bottom(), 0)?;
        }
        Ok(())
    }

    fn write_node<W: Write>(&self, out: &mut W, id: NodeId, depth: usize) -> fmt::Result {
        self.write_line(out, id, depth)?;

        let mut children: Vec<NodeId> = self
            .taxonomy
            .collect_subs(id, true)
            .into_iter()
            .filter(|&n| n != self.taxonomy.bottom())
            .collect();
        children.sort_by(|a, b| self.taxonomy.node(*a).name().cmp(self.taxonomy.node(*b).name()));

        for child in children {
            self.write_node(out, child, depth + 1)?;
        }
        Ok(())
    }

    fn write_line<W: Write>(&self, out: &mut W, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.taxonomy.node(id);
        let pad = depth * self.indent;

        let members: Vec<String> = node.equivalents().iter().map(|c| c.to_string()).collect();
        writeln!(out, "{:pad$}{}", "", members.join(" = "), pad = pad)?;

        if self.instances {
            for individual in node.instances() {
                writeln!(out, "{:pad$}- {}", "", individual, pad = pad + self.indent)?;
            }
        }
        Ok(())
    }
}
