use crate::models::{Calculation, User};

/// Tags that never count towards a favorite operator.
const UNCOUNTED: [&str; 3] = ["", "inconnu", "unknown"];

fn is_countable(operator: &str) -> bool {
    !UNCOUNTED.contains(&operator)
}

/// Folds a freshly stored calculation into its owner's derived fields.
///
/// Stores call this inside the same transaction that inserted `calculation`.
pub fn fold_into(user: &mut User, calculation: &Calculation) {
    user.calculations_count += 1;

    if is_countable(&calculation.operator) {
        user.operator_tally.bump(&calculation.operator);
    }
    user.favorite_operator = user.operator_tally.leader().map(str::to_string);
    user.last_calculation = Some(calculation.summary());
}
