/// Income/expense ledger aggregation and savings goals.
use std::collections::BTreeMap;

use crate::game::errors::LifeVerseError;
use crate::game::types::{EntryKind, Expense, GameState, SavingsGoal};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetSummary {
    pub total_income: i64,
    pub total_expense: i64,
    /// Income minus expense
    pub balance: i64,
    /// Spending per category; income entries are not included
    pub by_category: BTreeMap<String, i64>,
}

/// Record a ledger entry. Amounts are positive minor units; the kind carries the sign.
pub fn add_expense(state: &mut GameState, entry: Expense) -> Result<(), LifeVerseError> {
    if entry.amount <= 0 {
        return Err(LifeVerseError::InvalidInput(format!(
            "amount must be positive, got {}",
            entry.amount
        )));
    }
    if entry.category.trim().is_empty() {
        return Err(LifeVerseError::InvalidInput("category is empty".to_string()));
    }
    if state.expenses.iter().any(|e| e.id == entry.id) {
        return Err(LifeVerseError::DuplicateId(format!("expense: {}", entry.id)));
    }
    state.expenses.push(entry);
    Ok(())
}

pub fn budget_summary(expenses: &[Expense]) -> BudgetSummary {
    let mut summary = BudgetSummary::default();
    for entry in expenses {
        match entry.kind {
            EntryKind::Income => {
                summary.total_income = summary.total_income.saturating_add(entry.amount)
            }
            EntryKind::Expense => {
                summary.total_expense = summary.total_expense.saturating_add(entry.amount);
                let spent = summary
                    .by_category
                    .entry(entry.category.to_ascii_lowercase())
                    .or_insert(0);
                *spent = spent.saturating_add(entry.amount);
            }
        }
    }
    summary.balance = summary.total_income.saturating_sub(summary.total_expense);
    summary
}

pub fn add_savings_goal(state: &mut GameState, goal: SavingsGoal) -> Result<(), LifeVerseError> {
    if goal.target <= 0 {
        return Err(LifeVerseError::InvalidInput(
            "savings target must be positive".to_string(),
        ));
    }
    if state.savings_goals.iter().any(|g| g.id == goal.id) {
        return Err(LifeVerseError::DuplicateId(format!("savings goal: {}", goal.id)));
    }
    state.savings_goals.push(goal);
    Ok(())
}

/// Put money toward a goal. Returns true when this contribution reached the target.
pub fn contribute_to_goal(
    state: &mut GameState,
    goal_id: &str,
    amount: i64,
) -> Result<bool, LifeVerseError> {
    if amount <= 0 {
        return Err(LifeVerseError::InvalidInput(
            "contribution must be positive".to_string(),
        ));
    }
    let goal = state
        .savings_goals
        .iter_mut()
        .find(|g| g.id == goal_id)
        .ok_or_else(|| LifeVerseError::NotFound(format!("savings goal: {}", goal_id)))?;

    goal.saved = goal.saved.saturating_add(amount);
    let reached = !goal.completed && goal.saved >= goal.target;
    if reached {
        goal.completed = true;
    }
    Ok(reached)
}
