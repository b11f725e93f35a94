//! Visualization utilities for die routes.
//!
//! Generates SVG drawings of a route and plain-text exports for plotting.

use crate::instance::PlanningInstance;
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
    /// Target marker radius
    pub target_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            target_radius: 6.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG visualization of a solution
    pub fn generate_svg(&self, instance: &PlanningInstance, solution: &Solution) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(instance);

        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .target {{ fill: #3498db; stroke: #2c3e50; stroke-width: 2; }}
    .start {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .heading {{ stroke: #27ae60; stroke-width: 2; }}
    .edge {{ stroke: #34495e; stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<defs>
<marker id="arrow" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto" markerUnits="strokeWidth">
<path d="M0,0 L0,6 L9,3 z" fill="#34495e"/>
</marker>
</defs>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | Time: {:.3}s | {}</text>
"##,
            self.margin, instance.name, solution.total_time, solution.algorithm
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        let path = solution.path(instance);
        for pair in path.windows(2) {
            let (x1, y1) = transform(pair[0].x, pair[0].y);
            let (x2, y2) = transform(pair[1].x, pair[1].y);
            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="edge" marker-end="url(#arrow)"/>
"#,
                x1, y1, x2, y2
            ));
        }

        let tick = self.target_radius * 2.0;
        for (idx, target) in instance.targets.iter().enumerate() {
            let (x, y) = transform(target.position.x, target.position.y);
            let (sin, cos) = target.angle.to_radians().sin_cos();

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="target"/>
<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="heading"/>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x,
                y,
                self.target_radius,
                x,
                y,
                x + tick * cos,
                y - tick * sin,
                x,
                y - self.target_radius - 3.0,
                idx
            ));
        }

        let (sx, sy) = transform(instance.start.position.x, instance.start.position.y);
        svg.push_str(&format!(
            r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="start"/>
"##,
            sx, sy, self.target_radius
        ));

        let legend_y = self.height - 30.0;
        svg.push_str(&format!(
            r##"
<rect x="{}" y="{}" width="15" height="15" class="start"/>
<text x="{}" y="{}" class="label">Start</text>
<rect x="{}" y="{}" width="15" height="15" class="target"/>
<text x="{}" y="{}" class="label">Die center</text>
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

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Get coordinate bounds, start position included
    fn get_bounds(&self, instance: &PlanningInstance) -> (f64, f64, f64, f64) {
        let start = instance.start.position;
        let mut min_x = start.x;
        let mut max_x = start.x;
        let mut min_y = start.y;
        let mut max_y = start.y;

        for target in &instance.targets {
            min_x = min_x.min(target.position.x);
            max_x = max_x.max(target.position.x);
            min_y = min_y.min(target.position.y);
            max_y = max_y.max(target.position.y);
        }

        (min_x, max_x, min_y, max_y)
    }

    /// Export data for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, instance: &PlanningInstance, solution: &Solution) -> String {
        let mut data = String::new();

        data.push_str("# Die route data\n");
        data.push_str(&format!("# Instance: {}\n", instance.name));
        data.push_str(&format!("# Total time: {:.3}\n\n", solution.total_time));

        data.push_str("# Targets: index, x, y, angle\n");
        for (idx, target) in instance.targets.iter().enumerate() {
            data.push_str(&format!(
                "{},{},{},{}\n",
                idx, target.position.x, target.position.y, target.angle
            ));
        }

        data.push_str("\n# Tour: sequence of target indices\n");
        let tour_str: Vec<String> = solution.tour.iter().map(|n| n.to_string()).collect();
        data.push_str(&tour_str.join(","));
        data.push('\n');

        data
    }
}

/// Generate comparison plot data for multiple solutions
pub fn generate_comparison_data(solutions: &[Solution]) -> String {
    let mut data = String::new();

    data.push_str("# Algorithm Comparison\n");
    data.push_str("algorithm,total_time,compute_time\n");

    for sol in solutions {
        data.push_str(&format!(
            "{},{:.3},{:.4}\n",
            sol.algorithm, sol.total_time, sol.computation_time
        ));
    }

    data
}
