//! # Office Events
//!
//! Defines every event that flows through the shared bus. Each event name
//! pins exactly one payload shape: the variant of [`OfficeEvent`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// All events that can be emitted on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum OfficeEvent {
    // =========================================================================
    // CLIENTS
    // =========================================================================
    /// `client:selected`
    #[serde(rename = "client:selected")]
    ClientSelected {
        client_id: String,
        client_name: String,
        case_id: Option<String>,
        case_name: Option<String>,
    },

    /// `client:created`
    #[serde(rename = "client:created")]
    ClientCreated {
        client_id: String,
        client_name: String,
        created_by: String,
    },

    /// `client:updated`
    #[serde(rename = "client:updated")]
    ClientUpdated {
        client_id: String,
        changes: serde_json::Value,
        updated_by: String,
    },

    /// `client:deleted`
    #[serde(rename = "client:deleted")]
    ClientDeleted { client_id: String, deleted_by: String },

    // =========================================================================
    // TASKS
    // =========================================================================
    /// `task:created`
    #[serde(rename = "task:created")]
    TaskCreated {
        task_id: String,
        client_id: String,
        client_name: String,
        employee: String,
        /// Estimated effort in minutes.
        original_estimate: u32,
    },

    /// `task:updated`
    #[serde(rename = "task:updated")]
    TaskUpdated {
        task_id: String,
        changes: serde_json::Value,
        updated_by: String,
    },

    /// `task:completed`
    #[serde(rename = "task:completed")]
    TaskCompleted {
        task_id: String,
        client_id: String,
        completed_by: String,
        total_minutes: u32,
    },

    /// `task:budget-adjusted`
    #[serde(rename = "task:budget-adjusted")]
    TaskBudgetAdjusted {
        task_id: String,
        old_estimate: u32,
        new_estimate: u32,
        reason: String,
        adjusted_by: String,
    },

    /// `task:deadline-extended`
    #[serde(rename = "task:deadline-extended")]
    TaskDeadlineExtended {
        task_id: String,
        old_deadline: String,
        new_deadline: String,
        reason: String,
        extended_by: String,
    },

    // =========================================================================
    // TIMESHEETS
    // =========================================================================
    /// `timesheet:entry-created`
    #[serde(rename = "timesheet:entry-created")]
    TimesheetEntryCreated {
        entry_id: String,
        task_id: String,
        client_id: String,
        employee: String,
        minutes: u32,
        date: String,
    },

    /// `timesheet:entry-updated`
    #[serde(rename = "timesheet:entry-updated")]
    TimesheetEntryUpdated {
        entry_id: String,
        changes: serde_json::Value,
        updated_by: String,
    },

    /// `timesheet:entry-deleted`
    #[serde(rename = "timesheet:entry-deleted")]
    TimesheetEntryDeleted { entry_id: String, deleted_by: String },

    // =========================================================================
    // BUDGETS
    // =========================================================================
    /// `budget:warning-80`
    #[serde(rename = "budget:warning-80")]
    BudgetWarning80 {
        task_id: String,
        client_name: String,
        percentage_used: f64,
        remaining_minutes: i64,
    },

    /// `budget:warning-100`
    #[serde(rename = "budget:warning-100")]
    BudgetWarning100 {
        task_id: String,
        client_name: String,
        overage_minutes: i64,
    },

    /// `budget:overrun`
    #[serde(rename = "budget:overrun")]
    BudgetOverrun {
        task_id: String,
        client_name: String,
        total_minutes: i64,
        estimated_minutes: i64,
    },

    // =========================================================================
    // UI
    // =========================================================================
    /// `ui:dialog-opened`
    #[serde(rename = "ui:dialog-opened")]
    DialogOpened { dialog_id: String, dialog_type: String },

    /// `ui:dialog-closed`
    #[serde(rename = "ui:dialog-closed")]
    DialogClosed {
        dialog_id: String,
        result: Option<serde_json::Value>,
    },

    /// `ui:notification-shown`
    #[serde(rename = "ui:notification-shown")]
    NotificationShown {
        kind: NotificationKind,
        message: String,
    },

    /// `ui:tab-changed`
    #[serde(rename = "ui:tab-changed")]
    TabChanged { old_tab: String, new_tab: String },

    // =========================================================================
    // SELECTORS
    // =========================================================================
    /// `selector:budget-cleared`
    #[serde(rename = "selector:budget-cleared")]
    BudgetSelectorCleared,

    /// `selector:timesheet-cleared`
    #[serde(rename = "selector:timesheet-cleared")]
    TimesheetSelectorCleared,

    /// `selector:procedure-cleared`
    #[serde(rename = "selector:procedure-cleared")]
    ProcedureSelectorCleared,

    /// `selector:values-changed`
    #[serde(rename = "selector:values-changed")]
    SelectorValuesChanged {
        selector_type: SelectorType,
        values: serde_json::Value,
    },

    // =========================================================================
    // SYSTEM
    // =========================================================================
    /// `system:error` - a remote call failed or a listener failed.
    #[serde(rename = "system:error")]
    SystemError(SystemErrorPayload),

    /// `system:data-loaded` - a remote call settled successfully.
    #[serde(rename = "system:data-loaded")]
    DataLoaded {
        data_type: String,
        record_count: usize,
        /// Milliseconds from call start to settlement.
        duration: f64,
    },

    /// `system:cache-updated`
    #[serde(rename = "system:cache-updated")]
    CacheUpdated {
        cache_key: String,
        action: CacheAction,
    },
}

/// Payload of `system:error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemErrorPayload {
    /// Human readable error message.
    pub error: String,
    /// Where the failure happened.
    pub context: String,
    pub severity: Severity,
}

/// Severity attached to `system:error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Action carried by `system:cache-updated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheAction {
    Add,
    Update,
    Delete,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    Budget,
    Timesheet,
    Procedure,
}

/// Field-less discriminant of [`OfficeEvent`], used as the listener key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventName {
    ClientSelected,
    ClientCreated,
    ClientUpdated,
    ClientDeleted,
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskBudgetAdjusted,
    TaskDeadlineExtended,
    TimesheetEntryCreated,
    TimesheetEntryUpdated,
    TimesheetEntryDeleted,
    BudgetWarning80,
    BudgetWarning100,
    BudgetOverrun,
    DialogOpened,
    DialogClosed,
    NotificationShown,
    TabChanged,
    BudgetSelectorCleared,
    TimesheetSelectorCleared,
    ProcedureSelectorCleared,
    SelectorValuesChanged,
    SystemError,
    DataLoaded,
    CacheUpdated,
}

impl EventName {
    /// Every known event name, in declaration order.
    pub const ALL: [EventName; 26] = [
        Self::ClientSelected,
        Self::ClientCreated,
        Self::ClientUpdated,
        Self::ClientDeleted,
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskCompleted,
        Self::TaskBudgetAdjusted,
        Self::TaskDeadlineExtended,
        Self::TimesheetEntryCreated,
        Self::TimesheetEntryUpdated,
        Self::TimesheetEntryDeleted,
        Self::BudgetWarning80,
        Self::BudgetWarning100,
        Self::BudgetOverrun,
        Self::DialogOpened,
        Self::DialogClosed,
        Self::NotificationShown,
        Self::TabChanged,
        Self::BudgetSelectorCleared,
        Self::TimesheetSelectorCleared,
        Self::ProcedureSelectorCleared,
        Self::SelectorValuesChanged,
        Self::SystemError,
        Self::DataLoaded,
        Self::CacheUpdated,
    ];

    /// The wire name, e.g. `"system:error"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientSelected => "client:selected",
            Self::ClientCreated => "client:created",
            Self::ClientUpdated => "client:updated",
            Self::ClientDeleted => "client:deleted",
            Self::TaskCreated => "task:created",
            Self::TaskUpdated => "task:updated",
            Self::TaskCompleted => "task:completed",
            Self::TaskBudgetAdjusted => "task:budget-adjusted",
            Self::TaskDeadlineExtended => "task:deadline-extended",
            Self::TimesheetEntryCreated => "timesheet:entry-created",
            Self::TimesheetEntryUpdated => "timesheet:entry-updated",
            Self::TimesheetEntryDeleted => "timesheet:entry-deleted",
            Self::BudgetWarning80 => "budget:warning-80",
            Self::BudgetWarning100 => "budget:warning-100",
            Self::BudgetOverrun => "budget:overrun",
            Self::DialogOpened => "ui:dialog-opened",
            Self::DialogClosed => "ui:dialog-closed",
            Self::NotificationShown => "ui:notification-shown",
            Self::TabChanged => "ui:tab-changed",
            Self::BudgetSelectorCleared => "selector:budget-cleared",
            Self::TimesheetSelectorCleared => "selector:timesheet-cleared",
            Self::ProcedureSelectorCleared => "selector:procedure-cleared",
            Self::SelectorValuesChanged => "selector:values-changed",
            Self::SystemError => "system:error",
            Self::DataLoaded => "system:data-loaded",
            Self::CacheUpdated => "system:cache-updated",
        }
    }

    /// The family this event belongs to.
    #[must_use]
    pub fn family(self) -> EventFamily {
        match self {
            Self::ClientSelected | Self::ClientCreated | Self::ClientUpdated | Self::ClientDeleted => {
                EventFamily::Client
            }
            Self::TaskCreated
            | Self::TaskUpdated
            | Self::TaskCompleted
            | Self::TaskBudgetAdjusted
            | Self::TaskDeadlineExtended => EventFamily::Task,
            Self::TimesheetEntryCreated
            | Self::TimesheetEntryUpdated
            | Self::TimesheetEntryDeleted => EventFamily::Timesheet,
            Self::BudgetWarning80 | Self::BudgetWarning100 | Self::BudgetOverrun => {
                EventFamily::Budget
            }
            Self::DialogOpened | Self::DialogClosed | Self::NotificationShown | Self::TabChanged => {
                EventFamily::Ui
            }
            Self::BudgetSelectorCleared
            | Self::TimesheetSelectorCleared
            | Self::ProcedureSelectorCleared
            | Self::SelectorValuesChanged => EventFamily::Selector,
            Self::SystemError | Self::DataLoaded | Self::CacheUpdated => EventFamily::System,
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown event name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown event name: {0}")]
pub struct UnknownEventName(pub String);

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEventName(s.to_string()))
    }
}

/// Prefix group of an event name (`client`, `task`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFamily {
    Client,
    Task,
    Timesheet,
    Budget,
    Ui,
    Selector,
    System,
}

impl OfficeEvent {
    /// Get the name that listeners subscribe with.
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::ClientSelected { .. } => EventName::ClientSelected,
            Self::ClientCreated { .. } => EventName::ClientCreated,
            Self::ClientUpdated { .. } => EventName::ClientUpdated,
            Self::ClientDeleted { .. } => EventName::ClientDeleted,
            Self::TaskCreated { .. } => EventName::TaskCreated,
            Self::TaskUpdated { .. } => EventName::TaskUpdated,
            Self::TaskCompleted { .. } => EventName::TaskCompleted,
            Self::TaskBudgetAdjusted { .. } => EventName::TaskBudgetAdjusted,
            Self::TaskDeadlineExtended { .. } => EventName::TaskDeadlineExtended,
            Self::TimesheetEntryCreated { .. } => EventName::TimesheetEntryCreated,
            Self::TimesheetEntryUpdated { .. } => EventName::TimesheetEntryUpdated,
            Self::TimesheetEntryDeleted { .. } => EventName::TimesheetEntryDeleted,
            Self::BudgetWarning80 { .. } => EventName::BudgetWarning80,
            Self::BudgetWarning100 { .. } => EventName::BudgetWarning100,
            Self::BudgetOverrun { .. } => EventName::BudgetOverrun,
            Self::DialogOpened { .. } => EventName::DialogOpened,
            Self::DialogClosed { .. } => EventName::DialogClosed,
            Self::NotificationShown { .. } => EventName::NotificationShown,
            Self::TabChanged { .. } => EventName::TabChanged,
            Self::BudgetSelectorCleared => EventName::BudgetSelectorCleared,
            Self::TimesheetSelectorCleared => EventName::TimesheetSelectorCleared,
            Self::ProcedureSelectorCleared => EventName::ProcedureSelectorCleared,
            Self::SelectorValuesChanged { .. } => EventName::SelectorValuesChanged,
            Self::SystemError(_) => EventName::SystemError,
            Self::DataLoaded { .. } => EventName::DataLoaded,
            Self::CacheUpdated { .. } => EventName::CacheUpdated,
        }
    }

    /// Shorthand for building a `system:error` event.
    #[must_use]
    pub fn system_error(
        error: impl Into<String>,
        context: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self::SystemError(SystemErrorPayload {
            error: error.into(),
            context: context.into(),
            severity,
        })
    }
}
