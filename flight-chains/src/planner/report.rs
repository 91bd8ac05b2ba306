//! Plain-text rendering of ranked chains.

use std::fmt::Write;

use super::rank::RankedChain;

const HEADERS: [&str; 3] = ["Count", "Cost", "Route"];

/// Render ranked chains as an aligned table.
pub fn render_table(ranked: &[RankedChain]) -> String {
    let rows: Vec<[String; 3]> = ranked
        .iter()
        .map(|r| [r.score.to_string(), r.cost.to_string(), r.route.clone()])
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>w0$} | {:>w1$} | {}",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        w0 = widths[0],
        w1 = widths[1]
    );
    let _ = writeln!(
        out,
        "{}-+-{}-+-{}",
        "-".repeat(widths[0]),
        "-".repeat(widths[1]),
        "-".repeat(widths[2])
    );

    if rows.is_empty() {
        out.push_str("no itineraries found\n");
        return out;
    }

    for [count, cost, route] in &rows {
        let _ = writeln!(
            out,
            "{count:>w0$} | {cost:>w1$} | {route}",
            w0 = widths[0],
            w1 = widths[1]
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainId;
    use crate::domain::Cost;

    #[test]
    fn renders_rows_aligned() {
        let ranked = vec![
            RankedChain {
                chain: ChainId(3),
                score: 3,
                cost: Cost::from_cents(11500),
                route: "WAW -> VIE -> SOF -> WAW".to_string(),
            },
            RankedChain {
                chain: ChainId(5),
                score: 2,
                cost: Cost::from_cents(900),
                route: "WAW -> VIE -> WAW".to_string(),
            },
        ];

        let table = render_table(&ranked);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Count |   Cost | Route");
        assert_eq!(lines[2], "    3 | 115.00 | WAW -> VIE -> SOF -> WAW");
        assert_eq!(lines[3], "    2 |   9.00 | WAW -> VIE -> WAW");
    }

    #[test]
    fn empty_table_says_so() {
        let table = render_table(&[]);
        assert!(table.starts_with("Count | Cost | Route\n"));
        assert!(table.ends_with("no itineraries found\n"));
    }
}
