//! Stateless Elo arithmetic. Invalid outcomes and non-numeric ratings are
//! unrepresentable at this layer; the floor clamp is the only adjustment.

use super::Outcome;

/// Rating assigned to every mode of a freshly created player.
pub const DEFAULT_RATING: i32 = 1000;

/// No update may leave a player below this rating.
pub const RATING_FLOOR: i32 = 100;

pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Probability of `player` beating `opponent` under the Elo model.
pub fn expected_score(player: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10_f64.powf(f64::from(opponent - player) / 400.0))
}

/// New rating for `player` after a game against `opponent`, clamped to the
/// floor.
pub fn rate(player: i32, opponent: i32, outcome: Outcome, k_factor: f64) -> i32 {
    let expected = expected_score(player, opponent);
    let updated = f64::from(player) + k_factor * (outcome.score() - expected);
    (updated.round() as i32).max(RATING_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_score_is_symmetric_around_half() {
        let e = expected_score(1000, 1000);
        assert!((e - 0.5).abs() < 1e-12);
        let upset = expected_score(1000, 1200);
        assert!((upset + expected_score(1200, 1000) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn underdog_win_worked_example() {
        // 1000 beats 1200: 1000 + round(32 * (1 - 1/(1+10^(200/400)))) = 1024.
        assert_eq!(rate(1000, 1200, Outcome::Win, DEFAULT_K_FACTOR), 1024);
        assert_eq!(rate(1200, 1000, Outcome::Loss, DEFAULT_K_FACTOR), 1176);
    }

    #[test]
    fn equal_ratings_exchange_half_k() {
        assert_eq!(rate(1000, 1000, Outcome::Win, DEFAULT_K_FACTOR), 1016);
        assert_eq!(rate(1000, 1000, Outcome::Loss, DEFAULT_K_FACTOR), 984);
        assert_eq!(rate(1000, 1000, Outcome::Draw, DEFAULT_K_FACTOR), 1000);
    }

    #[test]
    fn deltas_are_zero_sum_and_bounded() {
        for (a, b) in [(1000, 1050), (800, 1600), (2400, 2300)] {
            let da = rate(a, b, Outcome::Win, DEFAULT_K_FACTOR) - a;
            let db = rate(b, a, Outcome::Loss, DEFAULT_K_FACTOR) - b;
            // Zero-sum up to rounding, each delta within k.
            assert!((da + db).abs() <= 1, "a={a} b={b}");
            assert!(da.abs() <= 32 && db.abs() <= 32);
        }
    }

    #[test]
    fn floor_is_enforced() {
        assert_eq!(rate(100, 2000, Outcome::Loss, DEFAULT_K_FACTOR), RATING_FLOOR);
        assert_eq!(rate(105, 105, Outcome::Loss, DEFAULT_K_FACTOR), RATING_FLOOR);
    }
}
