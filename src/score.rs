//! Run score and best score
//!
//! Distance travelled scores continuously; near misses pay a bonus that grows
//! with the current combo. The best score is the only value persisted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::is_finite_positive;
use crate::sim::ScoreSink;
use crate::tuning::ScoreTuning;

/// Score for the current run
#[derive(Debug, Clone)]
pub struct ScoreKeeper {
    tuning: ScoreTuning,
    current: f32,
    best: f32,
    run_start_best: f32,
    new_best: bool,
    combo: u32,
    best_combo: u32,
    near_misses: u32,
}

impl ScoreKeeper {
    pub fn new(tuning: ScoreTuning, best: f32) -> Self {
        let best = if best.is_finite() { best.max(0.0) } else { 0.0 };
        let mut keeper = Self {
            tuning: tuning.sanitized(),
            current: 0.0,
            best,
            run_start_best: best,
            new_best: false,
            combo: 0,
            best_combo: 0,
            near_misses: 0,
        };
        keeper.reset_run();
        keeper
    }

    pub fn reset_run(&mut self) {
        self.current = 0.0;
        self.run_start_best = self.best;
        self.new_best = false;
        self.combo = 0;
        self.best_combo = 0;
        self.near_misses = 0;
    }

    /// Store the run as the new best if it beat the best at run start
    pub fn commit_run_if_best(&mut self) -> bool {
        if !self.new_best {
            return false;
        }
        self.best = self.current;
        true
    }

    /// Multiplier for the current combo
    pub fn combo_multiplier(&self) -> f32 {
        if self.combo <= 1 {
            return 1.0;
        }
        let raw = 1.0 + (self.combo - 1) as f32 * self.tuning.combo_step;
        raw.min(self.tuning.max_combo_multiplier)
    }

    fn add_points(&mut self, points: f32) {
        self.current += points;
        self.new_best = self.current > self.run_start_best;
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn best(&self) -> f32 {
        self.best
    }

    pub fn is_current_run_new_best(&self) -> bool {
        self.new_best
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    pub fn near_misses(&self) -> u32 {
        self.near_misses
    }
}

impl ScoreSink for ScoreKeeper {
    fn add_distance(&mut self, amount: f32) {
        if !is_finite_positive(amount) {
            return;
        }
        self.add_points(amount * self.tuning.points_per_unit);
    }

    fn add_near_miss_bonus(&mut self, _distance: f32) {
        self.near_misses += 1;
        self.combo += 1;
        self.best_combo = self.best_combo.max(self.combo);

        let bonus = self.tuning.near_miss_bonus_points * self.combo_multiplier();
        if is_finite_positive(bonus) {
            self.add_points(bonus);
        }
    }

    fn clean_pass(&mut self) {
        self.combo = 0;
    }
}

/// On-disk form of the best score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct BestScoreFile {
    best_score: f32,
}

/// Persists a single float: the best score
#[derive(Debug, Clone)]
pub struct BestScoreStore {
    path: PathBuf,
}

impl BestScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored best; a missing file is 0
    pub fn try_load(&self) -> Result<f32> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0.0),
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        let file: BestScoreFile = serde_json::from_str(&json)?;
        Ok(if file.best_score.is_finite() {
            file.best_score.max(0.0)
        } else {
            0.0
        })
    }

    /// Like [`try_load`](Self::try_load) but falls back to 0 with a warning
    pub fn load(&self) -> f32 {
        match self.try_load() {
            Ok(best) => best,
            Err(e) => {
                log::warn!("Could not read best score, starting from 0: {e}");
                0.0
            }
        }
    }

    pub fn save(&self, best: f32) -> Result<()> {
        let json = serde_json::to_string(&BestScoreFile { best_score: best })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| Error::io(&self.path, e))?;
        log::info!("Best score saved ({best:.1})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keeper() -> ScoreKeeper {
        ScoreKeeper::new(ScoreTuning::default(), 0.0)
    }

    #[test]
    fn test_distance_scores_and_ignores_garbage() {
        let mut score = keeper();
        score.add_distance(10.0);
        score.add_distance(-3.0);
        score.add_distance(f32::NAN);
        score.add_distance(f32::INFINITY);
        assert_eq!(score.current(), 10.0);
    }

    #[test]
    fn test_combo_multiplies_bonus_and_is_capped() {
        let mut score = keeper();
        score.add_near_miss_bonus(0.05);
        assert_eq!(score.current(), 25.0);
        score.add_near_miss_bonus(0.05);
        assert_eq!(score.current(), 25.0 + 31.25);
        assert_eq!(score.combo(), 2);

        for _ in 0..20 {
            score.add_near_miss_bonus(0.05);
        }
        assert_eq!(score.combo_multiplier(), 3.0);
        assert_eq!(score.best_combo(), 22);
    }

    #[test]
    fn test_clean_pass_breaks_combo() {
        let mut score = keeper();
        score.add_near_miss_bonus(0.1);
        score.add_near_miss_bonus(0.1);
        score.clean_pass();
        assert_eq!(score.combo(), 0);
        assert_eq!(score.combo_multiplier(), 1.0);
        assert_eq!(score.best_combo(), 2);
        assert_eq!(score.near_misses(), 2);
    }

    #[test]
    fn test_new_best_is_relative_to_run_start() {
        let mut score = ScoreKeeper::new(ScoreTuning::default(), 50.0);
        score.add_distance(40.0);
        assert!(!score.is_current_run_new_best());
        assert!(!score.commit_run_if_best());

        score.add_distance(20.0);
        assert!(score.is_current_run_new_best());
        assert!(score.commit_run_if_best());
        assert_eq!(score.best(), 60.0);

        score.reset_run();
        score.add_distance(55.0);
        assert!(!score.is_current_run_new_best());
    }

    #[test]
    fn test_store_roundtrip_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("osl-best-{}", std::process::id()));
        let store = BestScoreStore::new(dir.join("best.json"));
        assert_eq!(store.try_load().unwrap(), 0.0);

        store.save(123.5).unwrap();
        assert_eq!(store.load(), 123.5);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_store_corrupt_file_falls_back() {
        let dir = std::env::temp_dir().join(format!("osl-corrupt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("best.json");
        std::fs::write(&path, "not json").unwrap();

        let store = BestScoreStore::new(&path);
        assert!(matches!(store.try_load(), Err(Error::Json(_))));
        assert_eq!(store.load(), 0.0);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
