// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Past-due invoices are marked overdue and chased once

use crate::prelude::*;
use shutter_adapters::NotifyCall;
use shutter_core::{Invoice, InvoiceStatus, JobKind, NewInvoice};
use shutter_engine::{JobOutcome, SweepKind};

async fn sent_invoice(h: &Harness, total: i64) -> Invoice {
    let service = h.runtime.service();
    let invoice = service
        .create_invoice(NewInvoice::new(STUDIO, "cust-1", total).due(t()))
        .unwrap();
    service.send_invoice(&invoice.id).await.unwrap()
}

#[tokio::test]
async fn overdue_sweep_marks_invoice_and_enqueues_one_reminder() {
    let h = Harness::at(t() - hours(48));
    let invoice = sent_invoice(&h, 25_000).await;
    assert_eq!(invoice.status, InvoiceStatus::Sent);

    h.clock.set(t() + hours(1));
    let report = h.runtime.sweeper().run(SweepKind::OverdueInvoices).await;

    assert_eq!(report.marked_overdue, 1);
    let stored = h.runtime.service().get_invoice(&invoice.id).unwrap();
    assert_eq!(stored.status, InvoiceStatus::Overdue);
    let queued = h.queued(JobKind::PaymentReminder);
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].subject_id, invoice.id.as_str());

    // A second sweep before the worker runs adds nothing
    let again = h.runtime.sweeper().run(SweepKind::OverdueInvoices).await;
    assert_eq!(again.marked_overdue, 0);
    assert_eq!(h.queued(JobKind::PaymentReminder).len(), 1);
}

#[tokio::test]
async fn payment_reminder_is_sent_by_the_next_tick() {
    let h = Harness::at(t() - hours(48));
    let invoice = sent_invoice(&h, 25_000).await;

    h.clock.set(t() + hours(1));
    let report = h.runtime.tick().await;

    let reminders: Vec<_> = report
        .jobs
        .iter()
        .filter(|r| r.job.kind == JobKind::PaymentReminder)
        .collect();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].outcome, JobOutcome::Dispatched);
    assert_eq!(
        h.reminders_sent(),
        vec![NotifyCall::PaymentReminder {
            invoice_id: invoice.id
        }]
    );
}

#[tokio::test]
async fn invoice_paid_before_reminder_runs_gets_none() {
    let h = Harness::at(t() - hours(48));
    let invoice = sent_invoice(&h, 25_000).await;

    h.clock.set(t() + hours(1));
    h.runtime.sweeper().run(SweepKind::OverdueInvoices).await;
    let paid = h
        .runtime
        .service()
        .record_payment(&invoice.id, 25_000)
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);

    let jobs = h.runtime.worker().run_due().await;

    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0].outcome,
        JobOutcome::NoOp {
            reason: "invoice settled"
        }
    );
    assert!(h.reminders_sent().is_empty());
}

#[tokio::test]
async fn invoice_not_yet_due_is_left_alone() {
    let h = Harness::at(t() - hours(48));
    let invoice = sent_invoice(&h, 25_000).await;

    h.clock.set(t() - hours(1));
    let report = h.runtime.sweeper().run(SweepKind::OverdueInvoices).await;

    assert_eq!(report.examined, 0);
    let stored = h.runtime.service().get_invoice(&invoice.id).unwrap();
    assert_eq!(stored.status, InvoiceStatus::Sent);
}
