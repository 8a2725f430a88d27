//! Random register/cancel sequences checked against a reference queue model.

mod common;

use std::collections::{BTreeSet, VecDeque};

use proptest::prelude::*;

use admission_core::error::AdmissionError;
use admission_core::registration::{AdmissionStatus, CancelOutcome};
use common::TestHarness;

#[derive(Debug, Clone, Copy)]
enum Op {
    Register(usize),
    Cancel(usize),
}

fn op_strategy(users: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..users).prop_map(Op::Register),
        2 => (0..users).prop_map(Op::Cancel),
    ]
}

/// Straightforward model of the admission rules
#[derive(Debug, Default)]
struct Model {
    capacity: usize,
    registered: BTreeSet<i64>,
    waitlist: VecDeque<i64>,
}

#[derive(Debug, PartialEq)]
enum Expected {
    Status(AdmissionStatus),
    Cancelled(CancelOutcome),
    AlreadyRegistered,
    NotFound,
}

impl Model {
    fn register(&mut self, user: i64) -> Expected {
        if self.registered.contains(&user) {
            return Expected::AlreadyRegistered;
        }
        if self.registered.len() < self.capacity {
            self.waitlist.retain(|u| *u != user);
            self.registered.insert(user);
            return Expected::Status(AdmissionStatus::Registered);
        }
        if !self.waitlist.contains(&user) {
            self.waitlist.push_back(user);
        }
        Expected::Status(AdmissionStatus::Waitlisted)
    }

    fn cancel(&mut self, user: i64) -> Expected {
        if self.registered.remove(&user) {
            let promoted = if self.registered.len() < self.capacity {
                self.waitlist.pop_front()
            } else {
                None
            };
            if let Some(promoted) = promoted {
                self.registered.insert(promoted);
            }
            return Expected::Cancelled(CancelOutcome::SeatReleased {
                promoted_user_id: promoted,
            });
        }
        if let Some(pos) = self.waitlist.iter().position(|u| *u == user) {
            self.waitlist.remove(pos);
            return Expected::Cancelled(CancelOutcome::LeftWaitlist);
        }
        Expected::NotFound
    }
}

fn run_sequence(capacity: i32, user_count: usize, ops: Vec<Op>) -> Result<(), TestCaseError> {
    tokio_test::block_on(async move {
        let h = TestHarness::new();
        let event = h.event(capacity).await;
        let users: Vec<i64> = h.users(user_count).await.iter().map(|u| u.id).collect();

        let mut model = Model {
            capacity: capacity as usize,
            ..Model::default()
        };

        for op in ops {
            let (actual, expected) = match op {
                Op::Register(i) => {
                    let actual = match h.engine.register(users[i], event.id).await {
                        Ok(result) => Expected::Status(result.status),
                        Err(AdmissionError::AlreadyRegistered { .. }) => {
                            Expected::AlreadyRegistered
                        }
                        Err(e) => return Err(TestCaseError::fail(format!("register: {e}"))),
                    };
                    (actual, model.register(users[i]))
                }
                Op::Cancel(i) => {
                    let actual = match h.engine.cancel(users[i], event.id).await {
                        Ok(outcome) => Expected::Cancelled(outcome),
                        Err(AdmissionError::RegistrationNotFound { .. }) => Expected::NotFound,
                        Err(e) => return Err(TestCaseError::fail(format!("cancel: {e}"))),
                    };
                    (actual, model.cancel(users[i]))
                }
            };
            prop_assert_eq!(actual, expected, "diverged on {:?}", op);

            let roster = h.engine.roster(event.id).await.unwrap();
            let registered: BTreeSet<i64> = roster.registered.iter().copied().collect();

            prop_assert!(roster.seats_taken() <= capacity as usize);
            prop_assert!(registered.iter().all(|u| !roster.is_waitlisted(*u)));
            prop_assert!(roster.waitlist.is_empty() || roster.seats_free() == 0);
            prop_assert_eq!(&registered, &model.registered);
            prop_assert_eq!(
                roster.waitlist.iter().copied().collect::<VecDeque<_>>(),
                model.waitlist.clone()
            );
        }

        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: the engine agrees with the queue model after every step,
    /// and capacity, exclusivity and "nobody waits beside a free seat" hold
    #[test]
    fn admission_matches_fifo_model(
        capacity in 1i32..4,
        ops in prop::collection::vec(op_strategy(6), 1..40),
    ) {
        run_sequence(capacity, 6, ops)?;
    }
}
