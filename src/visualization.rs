//! Visualization utilities for k-center solutions.
//!
//! Generates SVG drawings of center sets and convergence curves, and plain-text
//! exports for external plotting.

use crate::error::{KCenterError, Result};
use crate::instance::KCenterInstance;
use crate::solution::Solution;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Node radius
    pub node_radius: f64,
    /// Draw the covering radius around every center
    pub show_coverage: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 6.0,
            show_coverage: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG visualization of a solution.
    ///
    /// Needs node coordinates; weight-only instances are rejected.
    pub fn generate_svg(&self, instance: &KCenterInstance, solution: &Solution) -> Result<String> {
        if !instance.has_coordinates() {
            return Err(KCenterError::invalid(format!(
                "instance {} has no node coordinates to draw",
                instance.name
            )));
        }
        if solution.assignment.len() != instance.dimension {
            return Err(KCenterError::invalid("solution assignment does not match the instance"));
        }

        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(instance);

        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .node {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .center {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .edge {{ stroke: #95a5a6; stroke-width: 1; fill: none; }}
    .coverage {{ stroke: #e74c3c; stroke-width: 1; stroke-dasharray: 4,4; fill: #e74c3c; fill-opacity: 0.05; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | k = {} | Score: {:.3} | {}</text>
"##,
            self.margin,
            instance.name,
            solution.centers.len(),
            solution.score,
            solution.algorithm
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        if self.show_coverage {
            for &c in &solution.centers {
                let (cx, cy) = transform(instance.nodes[c].x, instance.nodes[c].y);
                svg.push_str(&format!(
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" class="coverage"/>
"#,
                    cx,
                    cy,
                    solution.score * scale
                ));
            }
        }

        for (node, &center) in solution.assignment.iter().enumerate() {
            if node == center {
                continue;
            }
            let (x1, y1) = transform(instance.nodes[node].x, instance.nodes[node].y);
            let (x2, y2) = transform(instance.nodes[center].x, instance.nodes[center].y);
            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="edge"/>
"#,
                x1, y1, x2, y2
            ));
        }

        for (i, node) in instance.nodes.iter().enumerate() {
            let (x, y) = transform(node.x, node.y);
            let is_center = solution.centers.contains(&i);
            let (class, r) = if is_center {
                ("center", self.node_radius * 1.5)
            } else {
                ("node", self.node_radius)
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, r, class
            ));

            svg.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x,
                y - r - 3.0,
                i
            ));
        }

        let legend_y = self.height - 30.0;
        svg.push_str(&format!(
            r##"
<rect x="{}" y="{}" width="15" height="15" class="center"/>
<text x="{}" y="{}" class="label">Center</text>
<rect x="{}" y="{}" width="15" height="15" class="node"/>
<text x="{}" y="{}" class="label">Node</text>
"##,
            self.margin,
            legend_y,
            self.margin + 20.0,
            legend_y + 12.0,
            self.margin + 80.0,
            legend_y,
            self.margin + 100.0,
            legend_y + 12.0
        ));

        svg.push_str("</svg>");

        Ok(svg)
    }

    /// Generate convergence SVG: best score of every generation
    pub fn generate_convergence_svg(&self, title: &str, scores: &[f64]) -> String {
        let mut svg = String::new();

        let width = self.width;
        let height = 300.0;
        let margin = 50.0;

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .line {{ stroke: #3498db; stroke-width: 2; fill: none; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            width, height, width, height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">Convergence - {} ({} generations)</text>
"#,
            margin,
            title,
            scores.len()
        ));

        let plot_width = width - 2.0 * margin;
        let plot_height = height - 2.0 * margin;

        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
"##,
            margin,
            height - margin,
            width - margin,
            height - margin,
            margin,
            margin,
            margin,
            height - margin
        ));

        let finite: Vec<f64> = scores.iter().cloned().filter(|s| s.is_finite()).collect();
        if !finite.is_empty() {
            let lo = finite.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let span = (hi - lo).max(1e-9);
            let x_scale = plot_width / (scores.len().max(2) - 1) as f64;
            let y_of = |s: f64| height - margin - (s - lo) / span * plot_height;

            svg.push_str(&format!(
                r#"<text x="5" y="{:.2}" class="label">{:.2}</text>
<text x="5" y="{:.2}" class="label">{:.2}</text>
"#,
                y_of(hi) + 4.0,
                hi,
                y_of(lo) + 4.0,
                lo
            ));

            let mut path = String::new();
            for (i, &s) in scores.iter().enumerate().filter(|(_, s)| s.is_finite()) {
                let x = margin + i as f64 * x_scale;
                let y = y_of(s);
                if path.is_empty() {
                    path.push_str(&format!("M {:.2} {:.2}", x, y));
                } else {
                    path.push_str(&format!(" L {:.2} {:.2}", x, y));
                }
            }

            svg.push_str(&format!(
                r##"<path d="{}" class="line"/>
"##,
                path
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Get coordinate bounds
    fn get_bounds(&self, instance: &KCenterInstance) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for node in &instance.nodes {
            min_x = min_x.min(node.x);
            max_x = max_x.max(node.x);
            min_y = min_y.min(node.y);
            max_y = max_y.max(node.y);
        }

        (min_x, max_x, min_y, max_y)
    }

    /// Export data for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, instance: &KCenterInstance, solution: &Solution, scores: &[f64]) -> String {
        let mut data = String::new();

        data.push_str("# k-Center Solution Data\n");
        data.push_str(&format!("# Instance: {}\n", instance.name));
        data.push_str(&format!("# Score: {:.3}\n", solution.score));
        data.push_str(&format!("# Algorithm: {}\n\n", solution.algorithm));

        if instance.has_coordinates() {
            data.push_str("# Nodes: index, x, y, center, assigned_to\n");
            for (i, node) in instance.nodes.iter().enumerate() {
                let assigned = solution.assignment.get(i).copied().unwrap_or(i);
                data.push_str(&format!(
                    "{},{},{},{},{}\n",
                    i,
                    node.x,
                    node.y,
                    u8::from(solution.centers.contains(&i)),
                    assigned
                ));
            }
        }

        data.push_str("\n# Centers\n");
        let centers: Vec<String> = solution.centers.iter().map(|c| c.to_string()).collect();
        data.push_str(&centers.join(","));
        data.push('\n');

        if !scores.is_empty() {
            data.push_str("\n# Convergence: best score per generation\n");
            let scores: Vec<String> = scores.iter().map(|s| format!("{:.3}", s)).collect();
            data.push_str(&scores.join(","));
            data.push('\n');
        }

        data
    }
}

/// Generate comparison plot data for multiple solutions
pub fn generate_comparison_data(solutions: &[Solution]) -> String {
    let mut data = String::new();

    data.push_str("# Algorithm Comparison\n");
    data.push_str("algorithm,score,time,centers\n");

    for sol in solutions {
        data.push_str(&format!(
            "{},{:.3},{:.4},{}\n",
            sol.algorithm,
            sol.score,
            sol.computation_time,
            sol.centers.len()
        ));
    }

    data
}
