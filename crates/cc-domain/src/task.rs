//! Tasks, their checklist items and stakeholder follow-ups.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::{Displayable, Identifiable, ScheduledItem},
    recurrence::RecurrenceRule,
};

pub const DEFAULT_FOLLOW_UP_DAYS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub direction: TaskDirection,
    #[serde(default)]
    pub related_stakeholders: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_legal_matter: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_property: Option<Uuid>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Occurrence this task was spawned from when it continues a recurrence chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_parent: Option<Uuid>,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            due_date: None,
            due_time: None,
            reminder_at: None,
            status: TaskStatus::NotStarted,
            priority: TaskPriority::default(),
            task_type: TaskType::default(),
            direction: TaskDirection::default(),
            related_stakeholders: Vec::new(),
            related_legal_matter: None,
            related_property: None,
            recurrence: None,
            recurrence_parent: None,
            subtasks: Vec::new(),
            follow_ups: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }

    pub fn is_meeting(&self) -> bool {
        self.task_type == TaskType::Meeting
    }

    /// Due date of the next occurrence, if the task recurs and has a due date.
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        self.next_occurrence()
    }

    /// Completed and total checklist items.
    pub fn checklist_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|item| item.is_completed).count();
        (done, self.subtasks.len())
    }

    pub fn has_stale_follow_ups(&self, now: DateTime<Utc>) -> bool {
        self.follow_ups.iter().any(|follow_up| follow_up.is_stale(now))
    }

    /// ISO-style schedule label: `2026-03-01T09:30:00`, `2026-03-01`, or empty.
    pub fn scheduled_label(&self) -> String {
        match (self.due_date, self.due_time) {
            (Some(date), Some(time)) => format!("{}T{}", date, time.format("%H:%M:%S")),
            (Some(date), None) => date.to_string(),
            _ => String::new(),
        }
    }

    /// Sets the status, stamping or clearing the completion timestamp.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.completed_at = if status == TaskStatus::Complete {
            Some(now)
        } else {
            None
        };
        self.status = status;
        self.updated_at = now;
    }
}

impl ScheduledItem for Task {
    fn base_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn recurrence_rule(&self) -> Option<RecurrenceRule> {
        self.recurrence
    }

    fn spawn_at(&self, next_date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: Some(next_date),
            due_time: self.due_time,
            reminder_at: None,
            status: TaskStatus::NotStarted,
            priority: self.priority,
            task_type: self.task_type,
            direction: self.direction,
            related_stakeholders: self.related_stakeholders.clone(),
            related_legal_matter: self.related_legal_matter,
            related_property: self.related_property,
            recurrence: self.recurrence,
            recurrence_parent: Some(self.id),
            subtasks: Vec::new(),
            follow_ups: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

impl Identifiable for Task {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Task {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.title, self.status)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
/// Lifecycle state of a task.
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Waiting,
    Complete,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Waiting,
        TaskStatus::Complete,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Complete => "complete",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|status| status.key() == normalized)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Waiting => "Waiting",
            TaskStatus::Complete => "Complete",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Critical,
        TaskPriority::High,
        TaskPriority::Medium,
        TaskPriority::Low,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TaskPriority::Critical => "critical",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|priority| priority.key() == normalized)
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskPriority::Critical => "Critical",
            TaskPriority::High => "High",
            TaskPriority::Medium => "Medium",
            TaskPriority::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    OneTime,
    Reference,
    Meeting,
}

impl TaskType {
    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "one_time" => Some(TaskType::OneTime),
            "reference" => Some(TaskType::Reference),
            "meeting" => Some(TaskType::Meeting),
            _ => None,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskType::OneTime => "One-Time",
            TaskType::Reference => "Reference",
            TaskType::Meeting => "Meeting",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
/// Whether a task is personal or a request travelling to/from a stakeholder.
pub enum TaskDirection {
    #[default]
    Personal,
    Outbound,
    Inbound,
}

impl TaskDirection {
    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(TaskDirection::Personal),
            "outbound" => Some(TaskDirection::Outbound),
            "inbound" => Some(TaskDirection::Inbound),
            _ => None,
        }
    }
}

impl fmt::Display for TaskDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskDirection::Personal => "Personal",
            TaskDirection::Outbound => "Outbound Request",
            TaskDirection::Inbound => "Inbound Request",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Checklist item nested under a task.
pub struct SubTask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub sort_order: u32,
}

impl SubTask {
    pub fn new(title: impl Into<String>, sort_order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: false,
            sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Outreach made to a stakeholder while a task is waiting on them.
pub struct FollowUp {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stakeholder: Option<Uuid>,
    pub outreach_at: DateTime<Utc>,
    pub method: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(default = "FollowUp::default_follow_up_days")]
    pub follow_up_days: u32,
    #[serde(default)]
    pub response_received: bool,
    #[serde(default)]
    pub response_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub response_notes: String,
    #[serde(default)]
    pub notes: String,
}

impl FollowUp {
    pub fn new(outreach_at: DateTime<Utc>, method: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stakeholder: None,
            outreach_at,
            method: method.into(),
            reminder_enabled: false,
            follow_up_days: DEFAULT_FOLLOW_UP_DAYS,
            response_received: false,
            response_at: None,
            response_notes: String::new(),
            notes: String::new(),
        }
    }

    pub fn default_follow_up_days() -> u32 {
        DEFAULT_FOLLOW_UP_DAYS
    }

    pub fn reminder_due_at(&self) -> DateTime<Utc> {
        self.outreach_at + Duration::days(i64::from(self.follow_up_days))
    }

    /// A follow-up is stale once its reminder window passes without a response.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.reminder_enabled && !self.response_received && now > self.reminder_due_at()
    }

    pub fn record_response(&mut self, at: DateTime<Utc>, notes: impl Into<String>) {
        self.response_received = true;
        self.response_at = Some(at);
        self.response_notes = notes.into();
    }
}
