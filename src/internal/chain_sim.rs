#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::pedantic)]
#![allow(clippy::unwrap_used)]
#![allow(warnings)]

use chainmap::{ChainMetrics, ChainedHashMap};
use plotters::prelude::*;
use rand::Rng;

// Capacities to compare: a prime, a nearby even number and a power of two.
// The index function is hash mod capacity; a prime capacity guards against
// clustering when hashes are patterned, and this measures how much that
// matters under the crate's default hasher.
const CAPACITIES: [(&str, usize); 3] = [("Prime 1009", 1009), ("Even 1000", 1000), ("Pow2 1024", 1024)];

// Load factors from 0.25 to 4.0; chains keep absorbing entries past 1.0
const NUM_LOAD_FACTORS: usize = 10;
const MIN_LOAD: f64 = 0.25;
const MAX_LOAD: f64 = 4.0;

/// Statistics gathered from one populated table
struct ChainStats {
    longest: usize,
    average: f64,
    empty_fraction: f64,
}

// Populate a fixed-capacity table with the given keys and read its shape
fn run_fill(capacity: usize, keys: &[u64]) -> ChainStats {
    let mut map = ChainedHashMap::with_capacity(capacity).unwrap();
    for &key in keys {
        map.insert(key, ());
    }

    let empty = map.empty_buckets();
    ChainStats {
        longest: map.longest_chain(),
        average: map.average_chain_length(),
        empty_fraction: empty as f64 / capacity as f64,
    }
}

// Strided keys (multiples of 8) are the patterned workload; random keys are
// the control group
fn strided_keys(count: usize) -> Vec<u64> {
    (0..count as u64).map(|i| i * 8).collect()
}

fn random_keys(count: usize) -> Vec<u64> {
    let mut rng = rand::rng();
    (0..count).map(|_| rng.random_range(1..100_000_000)).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| MIN_LOAD + (MAX_LOAD - MIN_LOAD) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();

    let base_capacity = CAPACITIES.iter().map(|&(_, c)| c).max().unwrap();
    let num_keys: Vec<usize> =
        load_factors.iter().map(|&load| (base_capacity as f64 * load) as usize).collect();

    println!("Load factors: {:?}", load_factors);
    println!("Number of keys: {:?}", num_keys);

    let max_keys_needed = *num_keys.iter().max().unwrap();
    let strided = strided_keys(max_keys_needed);
    let random = random_keys(max_keys_needed);

    // Per capacity, per load factor
    let mut longest_strided: Vec<Vec<f64>> = vec![Vec::new(); CAPACITIES.len()];
    let mut longest_random: Vec<Vec<f64>> = vec![Vec::new(); CAPACITIES.len()];
    let mut empty_strided: Vec<Vec<f64>> = vec![Vec::new(); CAPACITIES.len()];

    for &n_keys in &num_keys {
        println!("Testing with {} keys", n_keys);

        for (cap_idx, &(name, capacity)) in CAPACITIES.iter().enumerate() {
            let stats_strided = run_fill(capacity, &strided[..n_keys]);
            let stats_random = run_fill(capacity, &random[..n_keys]);

            longest_strided[cap_idx].push(stats_strided.longest as f64);
            longest_random[cap_idx].push(stats_random.longest as f64);
            empty_strided[cap_idx].push(stats_strided.empty_fraction * 100.0);

            println!(
                "  {}: strided longest = {}, avg = {:.2}, empty = {:.1}% | random longest = {}",
                name,
                stats_strided.longest,
                stats_strided.average,
                stats_strided.empty_fraction * 100.0,
                stats_random.longest,
            );
        }
    }

    let font_family = "sans-serif";
    let colors = [
        RGBColor(220, 50, 50), // Bright red
        RGBColor(50, 90, 220), // Bright blue
        RGBColor(50, 180, 50), // Bright green
    ];
    let line_width = 2;
    let marker_size = 4;
    let text_size = 16;
    let title_size = 35;

    let x_labels: Vec<String> = load_factors.iter().map(|l| format!("{:.2}", l)).collect();

    // Plot 1: longest chain under strided keys
    let root = BitMapBackend::new("longest_chain_strided.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_longest = longest_strided
        .iter()
        .flat_map(|v| v.iter())
        .fold(0.0, |max, &x| if x > max { x } else { max }) *
        1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Longest Chain vs Load Factor (strided keys)", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..(load_factors.len() - 1), 0.0..max_longest)?;

    chart
        .configure_mesh()
        .x_labels(load_factors.len() - 1)
        .x_label_formatter(&|x| {
            if *x < x_labels.len() { x_labels[*x].clone() } else { "".to_string() }
        })
        .x_desc("Load Factor (entries / buckets)")
        .y_desc("Longest Chain (entries)")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    for (cap_idx, &(name, _)) in CAPACITIES.iter().enumerate() {
        let color = &colors[cap_idx % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(line_width);

        chart
            .draw_series(LineSeries::new(
                (0..load_factors.len() - 1).map(|i| (i, longest_strided[cap_idx][i])),
                line_style,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series((0..load_factors.len() - 1).map(|i| {
            Circle::new((i, longest_strided[cap_idx][i]), marker_size, color.filled())
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    // Plot 2: longest chain under random keys (the control)
    let root = BitMapBackend::new("longest_chain_random.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_longest_random = longest_random
        .iter()
        .flat_map(|v| v.iter())
        .fold(0.0, |max, &x| if x > max { x } else { max }) *
        1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Longest Chain vs Load Factor (random keys)", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..(load_factors.len() - 1), 0.0..max_longest_random)?;

    chart
        .configure_mesh()
        .x_labels(load_factors.len() - 1)
        .x_label_formatter(&|x| {
            if *x < x_labels.len() { x_labels[*x].clone() } else { "".to_string() }
        })
        .x_desc("Load Factor (entries / buckets)")
        .y_desc("Longest Chain (entries)")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    for (cap_idx, &(name, _)) in CAPACITIES.iter().enumerate() {
        let color = &colors[cap_idx % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(line_width);

        chart
            .draw_series(LineSeries::new(
                (0..load_factors.len() - 1).map(|i| (i, longest_random[cap_idx][i])),
                line_style,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series((0..load_factors.len() - 1).map(|i| {
            Circle::new((i, longest_random[cap_idx][i]), marker_size, color.filled())
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    // Plot 3: fraction of buckets left empty under strided keys
    let root = BitMapBackend::new("empty_buckets_strided.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Empty Buckets vs Load Factor (strided keys)", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..(load_factors.len() - 1), 0.0..100.0)?;

    chart
        .configure_mesh()
        .x_labels(load_factors.len() - 1)
        .x_label_formatter(&|x| {
            if *x < x_labels.len() { x_labels[*x].clone() } else { "".to_string() }
        })
        .x_desc("Load Factor (entries / buckets)")
        .y_desc("Empty Buckets (%)")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    for (cap_idx, &(name, _)) in CAPACITIES.iter().enumerate() {
        let color = &colors[cap_idx % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(line_width);

        chart
            .draw_series(LineSeries::new(
                (0..load_factors.len() - 1).map(|i| (i, empty_strided[cap_idx][i])),
                line_style,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series((0..load_factors.len() - 1).map(|i| {
            Circle::new((i, empty_strided[cap_idx][i]), marker_size, color.filled())
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    println!(
        "Generated plot images: longest_chain_strided.png, longest_chain_random.png, empty_buckets_strided.png"
    );

    Ok(())
}
