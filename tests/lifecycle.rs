mod common;

use time::macros::{date, time};
use uuid::Uuid;

use advising_core::db::models::{
    AppointmentStatus, NewAvailabilityWindow, NotificationKind, Role,
};
use advising_core::{Scheduler, SchedulingError};

use common::{booking, scheduler};

async fn booked_pending(sched: &Scheduler) -> (Uuid, Uuid, Uuid) {
    let advisor = sched.register_advisor("Dr. Reyes").await.unwrap();
    let student = sched.register_student("Avery Chen").await.unwrap();
    sched
        .declare_availability(
            advisor,
            NewAvailabilityWindow::open(date!(2025 - 06 - 01), time!(9:00), time!(12:00)),
        )
        .await
        .unwrap();
    let id = sched
        .book_appointment(booking(student, advisor, date!(2025 - 06 - 01), time!(10:00), 30))
        .await
        .unwrap();
    (id, student, advisor)
}

#[tokio::test]
async fn confirm_then_decline_is_invalid() {
    let sched = scheduler().await;
    let (id, _, advisor) = booked_pending(&sched).await;

    sched.confirm_appointment(id, advisor).await.unwrap();
    assert_eq!(
        sched.get_appointment(id).await.unwrap().status,
        AppointmentStatus::Confirmed
    );

    let err = sched
        .decline_appointment(id, advisor, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn double_submission_of_the_same_transition_is_invalid() {
    let sched = scheduler().await;
    let (id, _, advisor) = booked_pending(&sched).await;

    sched.confirm_appointment(id, advisor).await.unwrap();
    let err = sched.confirm_appointment(id, advisor).await.unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidTransition { .. }));

    // The second attempt did not mutate anything.
    assert_eq!(
        sched.get_appointment(id).await.unwrap().status,
        AppointmentStatus::Confirmed
    );
}

#[tokio::test]
async fn transitions_check_ownership() {
    let sched = scheduler().await;
    let (id, student, _advisor) = booked_pending(&sched).await;
    let stranger = sched.register_advisor("Dr. Okafor").await.unwrap();

    assert!(matches!(
        sched.confirm_appointment(id, stranger).await.unwrap_err(),
        SchedulingError::NotOwner
    ));
    assert!(matches!(
        sched
            .decline_appointment(id, stranger, None)
            .await
            .unwrap_err(),
        SchedulingError::NotOwner
    ));
    assert!(matches!(
        sched
            .cancel_appointment(id, stranger, Role::Advisor)
            .await
            .unwrap_err(),
        SchedulingError::NotOwner
    ));
    // The student id under the advisor role does not own it either.
    assert!(matches!(
        sched
            .cancel_appointment(id, student, Role::Advisor)
            .await
            .unwrap_err(),
        SchedulingError::NotOwner
    ));
}

#[tokio::test]
async fn complete_requires_a_confirmed_appointment() {
    let sched = scheduler().await;
    let (id, _, advisor) = booked_pending(&sched).await;

    assert!(matches!(
        sched.complete_appointment(id).await.unwrap_err(),
        SchedulingError::InvalidTransition { .. }
    ));

    sched.confirm_appointment(id, advisor).await.unwrap();
    sched.complete_appointment(id).await.unwrap();
    assert_eq!(
        sched.get_appointment(id).await.unwrap().status,
        AppointmentStatus::Completed
    );

    assert!(matches!(
        sched.complete_appointment(id).await.unwrap_err(),
        SchedulingError::InvalidTransition { .. }
    ));
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let sched = scheduler().await;
    let advisor = sched.register_advisor("Dr. Reyes").await.unwrap();

    assert!(matches!(
        sched
            .confirm_appointment(Uuid::new_v4(), advisor)
            .await
            .unwrap_err(),
        SchedulingError::NotFound(_)
    ));
    assert!(matches!(
        sched.complete_appointment(Uuid::new_v4()).await.unwrap_err(),
        SchedulingError::NotFound(_)
    ));
}

#[tokio::test]
async fn each_transition_leaves_a_notification_trail() {
    let sched = scheduler().await;
    let (id, student, advisor) = booked_pending(&sched).await;

    // Booking notified both parties.
    assert_eq!(sched.unread_notification_count(student).await.unwrap(), 1);
    assert_eq!(sched.unread_notification_count(advisor).await.unwrap(), 1);
    let advisor_feed = sched.notifications_for(advisor, true).await.unwrap();
    assert_eq!(advisor_feed[0].kind, NotificationKind::AppointmentRequest);
    assert_eq!(advisor_feed[0].appointment_id, Some(id));

    sched.confirm_appointment(id, advisor).await.unwrap();
    let student_feed = sched.notifications_for(student, false).await.unwrap();
    assert_eq!(student_feed.len(), 2);
    assert!(student_feed
        .iter()
        .any(|n| n.kind == NotificationKind::AppointmentConfirmed));

    sched
        .cancel_appointment(id, student, Role::Student)
        .await
        .unwrap();
    // Student cancellation notifies the advisor and confirms to the student.
    assert_eq!(sched.unread_notification_count(advisor).await.unwrap(), 2);
    assert_eq!(sched.unread_notification_count(student).await.unwrap(), 3);

    sched.mark_all_notifications_read(student).await.unwrap();
    assert_eq!(sched.unread_notification_count(student).await.unwrap(), 0);

    let first_unread = sched.notifications_for(advisor, true).await.unwrap()[0].id;
    sched
        .mark_notification_read(first_unread, advisor)
        .await
        .unwrap();
    assert_eq!(sched.unread_notification_count(advisor).await.unwrap(), 1);
}

#[tokio::test]
async fn users_may_only_mark_their_own_notifications_read() {
    let sched = scheduler().await;
    let (_, student, advisor) = booked_pending(&sched).await;

    let advisors_notification = sched.notifications_for(advisor, true).await.unwrap()[0].id;
    assert!(matches!(
        sched
            .mark_notification_read(advisors_notification, student)
            .await
            .unwrap_err(),
        SchedulingError::NotOwner
    ));
    // Still unread for its actual owner.
    assert_eq!(sched.unread_notification_count(advisor).await.unwrap(), 1);

    assert!(matches!(
        sched
            .mark_notification_read(Uuid::new_v4(), advisor)
            .await
            .unwrap_err(),
        SchedulingError::NotFound(_)
    ));
}

#[tokio::test]
async fn reminders_reach_only_the_appointments_parties() {
    let sched = scheduler().await;
    let (id, student, advisor) = booked_pending(&sched).await;
    let stranger = sched.register_student("Jordan Li").await.unwrap();

    sched.remind_appointment(id, student, 2).await.unwrap();
    let feed = sched.notifications_for(student, false).await.unwrap();
    let reminder = feed
        .iter()
        .find(|n| n.kind == NotificationKind::AppointmentReminder)
        .expect("reminder notification");
    assert!(reminder.message.contains("2 hours"));
    assert_eq!(reminder.appointment_id, Some(id));

    sched.remind_appointment(id, advisor, 2).await.unwrap();

    assert!(matches!(
        sched.remind_appointment(id, stranger, 2).await.unwrap_err(),
        SchedulingError::NotOwner
    ));
    assert!(matches!(
        sched
            .remind_appointment(Uuid::new_v4(), student, 2)
            .await
            .unwrap_err(),
        SchedulingError::NotFound(_)
    ));
}

#[tokio::test]
async fn decline_reason_reaches_the_student() {
    let sched = scheduler().await;
    let (id, student, advisor) = booked_pending(&sched).await;

    sched
        .decline_appointment(id, advisor, Some("Out of office that week".to_string()))
        .await
        .unwrap();

    let feed = sched.notifications_for(student, false).await.unwrap();
    let declined = feed
        .iter()
        .find(|n| n.kind == NotificationKind::AppointmentDeclined)
        .expect("decline notification");
    assert!(declined.message.contains("Out of office that week"));
}

#[tokio::test]
async fn retiring_an_advisor_cancels_open_appointments_explicitly() {
    let sched = scheduler().await;
    let (id, student, advisor) = booked_pending(&sched).await;
    let confirmed = sched
        .book_appointment(booking(student, advisor, date!(2025 - 06 - 01), time!(11:00), 30))
        .await
        .unwrap();
    sched.confirm_appointment(confirmed, advisor).await.unwrap();

    let cancelled = sched.retire_advisor(advisor).await.unwrap();
    assert_eq!(cancelled, 2);

    for appointment in [id, confirmed] {
        assert_eq!(
            sched.get_appointment(appointment).await.unwrap().status,
            AppointmentStatus::Cancelled
        );
    }
    assert!(sched
        .list_availability(advisor, None)
        .await
        .unwrap()
        .is_empty());

    // Students were told, not left staring at vanished rows.
    let feed = sched.notifications_for(student, false).await.unwrap();
    assert_eq!(
        feed.iter()
            .filter(|n| n.kind == NotificationKind::AppointmentCancelled)
            .count(),
        2
    );

    // The advisor is gone for every later operation.
    assert!(matches!(
        sched.retire_advisor(advisor).await.unwrap_err(),
        SchedulingError::NotFound(_)
    ));
    let err = sched
        .book_appointment(booking(student, advisor, date!(2025 - 06 - 02), time!(10:00), 30))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::NotFound(_)));
}
