//! Opposed `2drn` checks: each side rolls two open-ended d6 and adds its value.

use rand::Rng;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;
use tabled::builder::Builder;
use tabled::settings::{Panel, Style};

/// Rolls per simulation.
pub const SIMULATIONS: usize = 1_000;
/// Consecutive sixes before a roll gives up and reports [`RUNAWAY_ROLL`].
pub const REROLL_CEILING: usize = 20;
pub const RUNAWAY_ROLL: u32 = 10_000;
/// Columns in the distribution sketch.
pub const SKETCH_WIDTH: usize = 30;
/// Extreme results left out of the sketch on each side.
const SKETCH_TRIM: usize = 10;

const CONFIDENCE: [(&str, f64); 4] = [
    ("50% win", 0.5),
    ("75% win", 0.75),
    ("90% win", 0.9),
    ("95% win", 0.95),
];

fn matchup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\s*vs?\s*(\d+)").unwrap_or_else(|_| unreachable!("matchup regex is valid"))
    })
}

/// `"<atk> vs <def>"` (or `v`) anywhere in `text`. Values above `u16::MAX` are not
/// accepted.
pub fn parse_matchup(text: &str) -> Option<(i64, i64)> {
    let caps = matchup_regex().captures(text)?;
    let attack: u16 = caps[1].parse().ok()?;
    let defence: u16 = caps[2].parse().ok()?;
    Some((i64::from(attack), i64::from(defence)))
}

/// One open-ended d6: a six counts as five and rolls again.
pub fn drn(rng: &mut impl Rng) -> u32 {
    let mut carried = 0;
    for _ in 0..=REROLL_CEILING {
        let roll: u32 = rng.gen_range(1..=6);
        if roll < 6 {
            return carried + roll;
        }
        carried += 5;
    }
    RUNAWAY_ROLL
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    pub attack: i64,
    pub defence: i64,
    /// Attacker margin of every roll, ascending.
    pub margins: Vec<i64>,
    pub wins: usize,
}

impl Matchup {
    pub fn average(&self) -> f64 {
        if self.margins.is_empty() {
            return 0.0;
        }
        self.margins.iter().sum::<i64>() as f64 / self.margins.len() as f64
    }

    pub fn win_rate(&self) -> f64 {
        if self.margins.is_empty() {
            return 0.0;
        }
        self.wins as f64 / self.margins.len() as f64
    }

    /// Consecutive wins achievable with probability `confidence`.
    pub fn streak(&self, confidence: f64) -> Option<f64> {
        // `+ 0.0` turns a certain win's -0 into 0
        let streak = (self.win_rate().ln() / confidence.ln()).ceil() + 0.0;
        streak.is_finite().then_some(streak)
    }

    /// Margins sampled at [`SKETCH_WIDTH`] evenly spaced ranks.
    pub fn sketch_samples(&self) -> Vec<i64> {
        let len = self.margins.len();
        if len == 0 {
            return Vec::new();
        }
        let lowest = SKETCH_TRIM.min(len - 1);
        let highest = len.saturating_sub(SKETCH_TRIM).max(lowest);
        (0..SKETCH_WIDTH)
            .map(|i| {
                let rank = (i * len / SKETCH_WIDTH).clamp(lowest, highest.min(len - 1));
                self.margins[rank]
            })
            .collect()
    }
}

/// Roll `2drn + attack` against `2drn + defence` [`SIMULATIONS`] times. Ties go to the
/// defender.
pub fn simulate(attack: i64, defence: i64, rng: &mut impl Rng) -> Matchup {
    let mut margins = Vec::with_capacity(SIMULATIONS);
    let mut wins = 0;
    for _ in 0..SIMULATIONS {
        let atk = i64::from(drn(rng) + drn(rng)) + attack;
        let def = i64::from(drn(rng) + drn(rng)) + defence;
        let margin = atk - def;
        if margin > 0 {
            wins += 1;
        }
        margins.push(margin);
    }
    margins.sort_unstable();
    Matchup {
        attack,
        defence,
        margins,
        wins,
    }
}

fn table(matchup: &Matchup) -> Vec<String> {
    let mut builder = Builder::default();
    builder.push_record(["Avg".to_string(), format!("{:.2}", matchup.average())]);
    builder.push_record([
        "Win %".to_string(),
        format!("{:.2}", matchup.win_rate() * 100.0),
    ]);
    for (label, confidence) in CONFIDENCE {
        let value = matchup
            .streak(confidence)
            .map_or_else(|| "-".to_string(), |streak| format!("{streak}"));
        builder.push_record([label.to_string(), value]);
    }

    let mut table = builder.build();
    table
        .with(Panel::header(format!("{} vs {}", matchup.attack, matchup.defence)))
        .with(Style::ascii());
    table.to_string().lines().map(str::to_string).collect()
}

fn sketch(samples: &[i64], height: usize) -> Vec<String> {
    if samples.is_empty() || height == 0 {
        return vec![String::new(); height];
    }
    let top = samples.iter().copied().max().unwrap_or(0).max(0);
    let bottom = samples.iter().copied().min().unwrap_or(0).min(0);
    let span = (top - bottom).max(1) as f64;
    let row_of = |value: i64| {
        let scaled = (top - value) as f64 / span * (height - 1) as f64;
        scaled.round() as usize
    };
    let zero_row = row_of(0);

    let mut grid = vec![vec![' '; samples.len()]; height];
    for (col, value) in samples.iter().enumerate() {
        grid[zero_row][col] = '-';
        grid[row_of(*value)][col] = '*';
    }
    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// Table of the matchup's statistics with the distribution sketch to its right, as a
/// fenced code block.
pub fn render(matchup: &Matchup) -> String {
    let table = table(matchup);
    let sketch = sketch(&matchup.sketch_samples(), table.len());
    let mut out = String::from("```\n");
    for (row, plot) in table.iter().zip(sketch.iter()) {
        let _ = writeln!(out, "{}", format!("{row} {plot}").trim_end());
    }
    out.push_str("```");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parses_both_separators() {
        assert_eq!(parse_matchup("5 vs 3"), Some((5, 3)));
        assert_eq!(parse_matchup("12v9"), Some((12, 9)));
        assert_eq!(parse_matchup("10 v 10"), Some((10, 10)));
        assert_eq!(parse_matchup("five vs three"), None);
        assert_eq!(parse_matchup("65535 vs 0"), Some((65_535, 0)));
        assert_eq!(parse_matchup(""), None);
    }

    #[test]
    fn oversized_operands_are_unrecognized() {
        assert_eq!(parse_matchup("9223372036854775807 vs 0"), None);
        assert_eq!(parse_matchup("10000000000000000 vs 0"), None);
        assert_eq!(parse_matchup("3 vs 65536"), None);
    }

    #[test]
    fn largest_operands_render_without_overflow() {
        let mut rng = StdRng::seed_from_u64(3);
        let (attack, defence) = parse_matchup("65535 vs 0").expect("in range");
        let matchup = simulate(attack, defence, &mut rng);
        assert_eq!(matchup.wins, SIMULATIONS);
        assert!(matchup.average() > 65_000.0);
        assert!(render(&matchup).contains("65535 vs 0"));
    }

    #[test]
    fn drn_is_open_ended() {
        let mut rng = StdRng::seed_from_u64(7);
        let rolls: Vec<u32> = (0..10_000).map(|_| drn(&mut rng)).collect();
        assert!(rolls.iter().all(|roll| (1..RUNAWAY_ROLL).contains(roll)));
        assert!(rolls.iter().any(|roll| *roll > 6));
    }

    #[test]
    fn simulation_is_sorted_and_counts_wins() {
        let mut rng = StdRng::seed_from_u64(42);
        let matchup = simulate(5, 3, &mut rng);
        assert_eq!(matchup.margins.len(), SIMULATIONS);
        assert!(matchup.margins.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            matchup.wins,
            matchup.margins.iter().filter(|m| **m > 0).count()
        );
        assert!(matchup.win_rate() > 0.5);
        assert_eq!(matchup.sketch_samples().len(), SKETCH_WIDTH);
    }

    #[test]
    fn certain_loss_has_no_streak() {
        let matchup = Matchup {
            attack: 0,
            defence: 100,
            margins: vec![-100, -90],
            wins: 0,
        };
        assert_eq!(matchup.streak(0.5), None);
        let sure = Matchup {
            wins: 2,
            margins: vec![90, 100],
            ..matchup
        };
        assert_eq!(sure.streak(0.95), Some(0.0));
    }

    #[test]
    fn render_is_a_code_block_with_every_row() {
        let mut rng = StdRng::seed_from_u64(1);
        let text = render(&simulate(4, 4, &mut rng));
        assert!(text.starts_with("```\n"));
        assert!(text.ends_with("```"));
        for label in ["4 vs 4", "Avg", "Win %", "50% win", "75% win", "90% win", "95% win"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains('*'));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with('+'), "bordered table: {}", lines[1]);
    }
}
