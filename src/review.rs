use chrono::NaiveDate;

use crate::dates::{date_string, month_key};
use crate::error::AppError;
use crate::models::{MONTHLY_REVIEWS, MonthlyReview, MonthlyReviews, intention_key};
use crate::repository::{load_value, save_value};
use crate::store::KeyedStore;
use crate::workspace::Workspace;

pub const MOODS: [&str; 5] = ["😊", "🙂", "😐", "😔", "😫"];
pub const ENERGY_LEVELS: std::ops::RangeInclusive<u8> = 1..=5;

impl<S: KeyedStore> Workspace<S> {
    pub fn reviews(&self) -> MonthlyReviews {
        load_value(&self.store, MONTHLY_REVIEWS).unwrap_or_default()
    }

    /// The review for `month` (`YYYY-MM`), empty when none was saved.
    pub fn review(&self, month: &str) -> MonthlyReview {
        self.reviews().remove(month).unwrap_or_default()
    }

    pub fn save_review(&mut self, month: &str, review: MonthlyReview) -> Result<(), AppError> {
        validate_month_key(month)?;
        let mut reviews = self.reviews();
        reviews.insert(month.to_string(), review);
        save_value(&mut self.store, MONTHLY_REVIEWS, &reviews)?;
        Ok(())
    }

    /// Records the mood glyph for `date` in the review of the month containing it.
    pub fn log_mood(&mut self, date: NaiveDate, mood: &str) -> Result<MonthlyReview, AppError> {
        if !MOODS.contains(&mood) {
            return Err(AppError::invalid(
                "mood",
                format!("must be one of {}", MOODS.join(" ")),
            ));
        }
        self.edit_review_for(date, |review| {
            review.mood.insert(date_string(date), mood.to_string());
        })
    }

    pub fn log_energy(&mut self, date: NaiveDate, level: u8) -> Result<MonthlyReview, AppError> {
        if !ENERGY_LEVELS.contains(&level) {
            return Err(AppError::invalid("energy", "must be between 1 and 5"));
        }
        self.edit_review_for(date, |review| {
            review.energy.insert(date_string(date), level);
        })
    }

    pub fn intention(&self, date: NaiveDate) -> Option<String> {
        self.store.get(&intention_key(date))
    }

    pub fn set_intention(&mut self, date: NaiveDate, text: &str) -> Result<(), AppError> {
        self.store.set(&intention_key(date), text.to_string())?;
        Ok(())
    }

    fn edit_review_for(
        &mut self,
        date: NaiveDate,
        edit: impl FnOnce(&mut MonthlyReview),
    ) -> Result<MonthlyReview, AppError> {
        let month = month_key(date);
        let mut reviews = self.reviews();
        let review = reviews.entry(month).or_default();
        edit(review);
        let updated = review.clone();
        save_value(&mut self.store, MONTHLY_REVIEWS, &reviews)?;
        Ok(updated)
    }
}

fn validate_month_key(month: &str) -> Result<(), AppError> {
    let valid = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok()
        && month.len() == 7;
    if !valid {
        return Err(AppError::invalid("month", "must look like YYYY-MM"));
    }
    Ok(())
}
