use crate::domain::error::DomainError;
use crate::domain::models::{Plan, TodoItem, next_id, validate_hhmm};
use chrono::Weekday;

/// Weekly planner entries. Kept in memory only.
#[derive(Debug, Default)]
pub struct Planner {
    plans: Vec<Plan>,
}

impl Planner {
    pub fn add_plan(
        &mut self,
        subject: &str,
        day: Weekday,
        time: &str,
    ) -> Result<Plan, DomainError> {
        let subject = subject.trim();
        let time = time.trim();
        if subject.is_empty() {
            return Err(DomainError::MissingRequiredField("plan.subject"));
        }
        if time.is_empty() {
            return Err(DomainError::MissingRequiredField("plan.time"));
        }
        validate_hhmm(time, "plan.time")?;

        let plan = Plan {
            id: next_id(),
            subject: subject.to_string(),
            day,
            time: time.to_string(),
        };
        self.plans.push(plan.clone());
        Ok(plan)
    }

    /// Removes the plan if present; returns whether anything was removed.
    pub fn delete_plan(&mut self, plan_id: i64) -> bool {
        let before = self.plans.len();
        self.plans.retain(|plan| plan.id != plan_id);
        self.plans.len() != before
    }

    /// All plans ordered by time of day. Equal times keep insertion order.
    pub fn plans(&self) -> Vec<Plan> {
        let mut plans = self.plans.clone();
        plans.sort_by(|left, right| left.time.cmp(&right.time));
        plans
    }

    pub fn plans_for_day(&self, day: Weekday) -> Vec<Plan> {
        self.plans()
            .into_iter()
            .filter(|plan| plan.day == day)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// To-do items, newest first. Kept in memory only.
#[derive(Debug, Default)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn add_todo(&mut self, text: &str) -> Result<TodoItem, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::MissingRequiredField("todo.text"));
        }
        let item = TodoItem {
            id: next_id(),
            text: text.to_string(),
            completed: false,
        };
        self.items.insert(0, item.clone());
        Ok(item)
    }

    /// Flips the completed flag, returning the updated item.
    pub fn toggle(&mut self, todo_id: i64) -> Option<TodoItem> {
        let item = self.items.iter_mut().find(|item| item.id == todo_id)?;
        item.completed = !item.completed;
        Some(item.clone())
    }

    pub fn delete(&mut self, todo_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != todo_id);
        self.items.len() != before
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }
}
