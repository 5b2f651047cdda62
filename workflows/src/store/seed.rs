//! Sample records used when nothing has been persisted yet

use chrono::{DateTime, TimeZone, Utc};

use crate::models::execution::{ActionExecution, ActionStatus, ExecutionStatus, WorkflowExecution};
use crate::models::workflow::{
    ConditionOperator, StepType, Workflow, WorkflowCondition, WorkflowStatus, WorkflowStep,
};

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The four sample workflows (`wf-1`..`wf-4`). None of them starts out active.
pub fn sample_workflows() -> Vec<Workflow> {
    vec![
        Workflow {
            id: "wf-1".to_string(),
            name: "New Patient Welcome Series".to_string(),
            description: "Welcome email, intake form nudge and a follow-up call for newly registered patients"
                .to_string(),
            status: WorkflowStatus::Inactive,
            trigger: "new_patient".to_string(),
            steps: vec![
                WorkflowStep::new("wf-1-s1", StepType::Email)
                    .with_config("template", "welcome_new_patient")
                    .with_config("subject", "Welcome to our practice"),
                WorkflowStep::new("wf-1-s2", StepType::Sms)
                    .with_config("message", "Please complete your intake forms before your first visit.")
                    .with_delay_days(1),
                WorkflowStep::new("wf-1-s3", StepType::Task)
                    .with_config("title", "Welcome call")
                    .with_config("assignee", "front_desk")
                    .with_delay_days(3),
            ],
            conditions: vec![],
            created_at: at(2024, 1, 15, 9),
            updated_at: at(2024, 3, 2, 14),
            last_run: Some(at(2024, 3, 1, 8)),
            created_by: "Dr. Sarah Johnson".to_string(),
        },
        Workflow {
            id: "wf-2".to_string(),
            name: "Appointment Reminder".to_string(),
            description: "Email and SMS reminders ahead of scheduled in-person appointments".to_string(),
            status: WorkflowStatus::Paused,
            trigger: "appointment_scheduled".to_string(),
            steps: vec![
                WorkflowStep::new("wf-2-s1", StepType::Email)
                    .with_config("template", "appointment_confirmation"),
                WorkflowStep::new("wf-2-s2", StepType::Sms)
                    .with_config("message", "Reminder: you have an appointment tomorrow.")
                    .with_delay_days(1),
            ],
            conditions: vec![WorkflowCondition::new(
                "appointment.type",
                ConditionOperator::NotEquals,
                "telehealth",
            )],
            created_at: at(2024, 1, 20, 10),
            updated_at: at(2024, 2, 28, 16),
            last_run: Some(at(2024, 2, 27, 7)),
            created_by: "Admin".to_string(),
        },
        Workflow {
            id: "wf-3".to_string(),
            name: "Post-Visit Follow-up".to_string(),
            description: "Satisfaction survey after a completed visit, escalating low scores to staff"
                .to_string(),
            status: WorkflowStatus::Draft,
            trigger: "appointment_completed".to_string(),
            steps: vec![
                WorkflowStep::new("wf-3-s1", StepType::Wait).with_delay_days(2),
                WorkflowStep::new("wf-3-s2", StepType::Email)
                    .with_config("template", "satisfaction_survey"),
                WorkflowStep::new("wf-3-s3", StepType::Condition)
                    .with_config("field", "survey.score")
                    .with_config("operator", "less_than")
                    .with_config("value", 3),
                WorkflowStep::new("wf-3-s4", StepType::Task)
                    .with_config("title", "Call patient about visit feedback")
                    .with_config("priority", "high"),
            ],
            conditions: vec![],
            created_at: at(2024, 2, 5, 11),
            updated_at: at(2024, 2, 5, 11),
            last_run: None,
            created_by: "Dr. Michael Chen".to_string(),
        },
        Workflow {
            id: "wf-4".to_string(),
            name: "Medication Refill Reminder".to_string(),
            description: "Reminds patients to request a refill before their prescription runs out"
                .to_string(),
            status: WorkflowStatus::Paused,
            trigger: "medication_refill_due".to_string(),
            steps: vec![
                WorkflowStep::new("wf-4-s1", StepType::Sms)
                    .with_config("message", "Your prescription is due for a refill."),
                WorkflowStep::new("wf-4-s2", StepType::Email)
                    .with_config("template", "refill_reminder")
                    .with_delay_days(3),
            ],
            conditions: vec![WorkflowCondition::new(
                "medication.refillsRemaining",
                ConditionOperator::GreaterThan,
                0,
            )],
            created_at: at(2024, 2, 12, 15),
            updated_at: at(2024, 2, 20, 9),
            last_run: None,
            created_by: "Pharmacy Team".to_string(),
        },
    ]
}

/// Historical executions matching [`sample_workflows`]
pub fn sample_executions() -> Vec<WorkflowExecution> {
    vec![
        WorkflowExecution {
            id: "exec-1".to_string(),
            workflow_id: "wf-1".to_string(),
            patient_id: Some("patient-101".to_string()),
            appointment_id: None,
            triggered_at: at(2024, 2, 26, 8),
            completed_at: Some(at(2024, 2, 29, 8)),
            status: ExecutionStatus::Completed,
            actions: vec![
                ActionExecution {
                    action_id: "wf-1-s1".to_string(),
                    status: ActionStatus::Completed,
                    scheduled_for: at(2024, 2, 26, 8),
                    completed_at: Some(at(2024, 2, 26, 8)),
                    result: Some("Email delivered".to_string()),
                    error: None,
                },
                ActionExecution {
                    action_id: "wf-1-s2".to_string(),
                    status: ActionStatus::Completed,
                    scheduled_for: at(2024, 2, 27, 8),
                    completed_at: Some(at(2024, 2, 27, 8)),
                    result: Some("SMS delivered".to_string()),
                    error: None,
                },
                ActionExecution {
                    action_id: "wf-1-s3".to_string(),
                    status: ActionStatus::Completed,
                    scheduled_for: at(2024, 2, 29, 8),
                    completed_at: Some(at(2024, 2, 29, 8)),
                    result: Some("Task created".to_string()),
                    error: None,
                },
            ],
        },
        WorkflowExecution {
            id: "exec-2".to_string(),
            workflow_id: "wf-2".to_string(),
            patient_id: Some("patient-204".to_string()),
            appointment_id: Some("appt-881".to_string()),
            triggered_at: at(2024, 2, 27, 7),
            completed_at: None,
            status: ExecutionStatus::InProgress,
            actions: vec![
                ActionExecution {
                    action_id: "wf-2-s1".to_string(),
                    status: ActionStatus::Completed,
                    scheduled_for: at(2024, 2, 27, 7),
                    completed_at: Some(at(2024, 2, 27, 7)),
                    result: Some("Email delivered".to_string()),
                    error: None,
                },
                ActionExecution {
                    action_id: "wf-2-s2".to_string(),
                    status: ActionStatus::Pending,
                    scheduled_for: at(2024, 2, 28, 7),
                    completed_at: None,
                    result: None,
                    error: None,
                },
            ],
        },
        WorkflowExecution {
            id: "exec-3".to_string(),
            workflow_id: "wf-1".to_string(),
            patient_id: Some("patient-117".to_string()),
            appointment_id: None,
            triggered_at: at(2024, 3, 1, 8),
            completed_at: Some(at(2024, 3, 1, 8)),
            status: ExecutionStatus::Failed,
            actions: vec![ActionExecution {
                action_id: "wf-1-s1".to_string(),
                status: ActionStatus::Failed,
                scheduled_for: at(2024, 3, 1, 8),
                completed_at: None,
                result: None,
                error: Some("Patient has no email address on file".to_string()),
            }],
        },
    ]
}
