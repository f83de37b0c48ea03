//! Reversible tour mutations.
//!
//! Each command captures the forward arguments of an insert/remove plus the
//! predecessor stops needed to synthesize the exact inverse. Both
//! directions go through the planner's `add_request`/`delete_request`
//! primitives, which are exact inverses given the same predecessors.

use crate::planner::TourPlanner;
use crate::tour::{Request, Stop, Tour};

/// A reversible edit of a computed tour.
#[derive(Debug, Clone)]
pub enum TourCommand {
    AddRequest {
        request: Request,
        pickup_pred: Stop,
        delivery_pred: Stop,
    },
    DeleteRequest {
        request: Request,
        /// Predecessors at deletion time, captured so undo can re-insert
        /// the request at its original place.
        pickup_pred: Stop,
        delivery_pred: Stop,
    },
}

impl TourCommand {
    /// Capture a deletion with the predecessors the request currently has.
    pub fn delete(tour: &Tour, request: Request) -> Result<Self, String> {
        let pickup_index = tour
            .position_of(&request.pickup)
            .ok_or_else(|| "the request pickup is not in the computed tour".to_string())?;
        let delivery_index = tour
            .position_of(&request.delivery)
            .ok_or_else(|| "the request delivery is not in the computed tour".to_string())?;
        if pickup_index == 0 || delivery_index == 0 {
            return Err("the request stops are misplaced in the tour".to_string());
        }
        // Predecessors as they will be once both stops are gone: skip the
        // request's own pickup when it directly precedes the delivery.
        let pickup_pred = tour.ordered_travel[pickup_index - 1].clone();
        let delivery_pred = if delivery_index - 1 == pickup_index {
            pickup_pred.clone()
        } else {
            tour.ordered_travel[delivery_index - 1].clone()
        };
        Ok(TourCommand::DeleteRequest {
            request,
            pickup_pred,
            delivery_pred,
        })
    }

    fn apply(&self, planner: &TourPlanner, tour: &mut Tour) -> Result<(), String> {
        match self {
            TourCommand::AddRequest {
                request,
                pickup_pred,
                delivery_pred,
            } => planner.add_request(
                tour,
                request.pickup.clone(),
                request.delivery.clone(),
                pickup_pred,
                delivery_pred,
            ),
            TourCommand::DeleteRequest { request, .. } => planner.delete_request(tour, request),
        }
    }

    fn revert(&self, planner: &TourPlanner, tour: &mut Tour) -> Result<(), String> {
        match self {
            TourCommand::AddRequest { request, .. } => planner.delete_request(tour, request),
            TourCommand::DeleteRequest {
                request,
                pickup_pred,
                delivery_pred,
            } => planner.add_request(
                tour,
                request.pickup.clone(),
                request.delivery.clone(),
                pickup_pred,
                delivery_pred,
            ),
        }
    }
}

/// Linear undo/redo history of tour edits.
#[derive(Default)]
pub struct CommandLog {
    done: Vec<TourCommand>,
    undone: Vec<TourCommand>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command and push it on the history; a new edit clears the
    /// redo stack.
    pub fn apply(
        &mut self,
        planner: &TourPlanner,
        tour: &mut Tour,
        command: TourCommand,
    ) -> Result<(), String> {
        command.apply(planner, tour)?;
        self.done.push(command);
        self.undone.clear();
        Ok(())
    }

    /// Revert the most recent command; no-op when the history is empty.
    pub fn undo(&mut self, planner: &TourPlanner, tour: &mut Tour) -> Result<(), String> {
        if let Some(command) = self.done.pop() {
            command.revert(planner, tour)?;
            self.undone.push(command);
        }
        Ok(())
    }

    /// Re-apply the most recently undone command.
    pub fn redo(&mut self, planner: &TourPlanner, tour: &mut Tour) -> Result<(), String> {
        if let Some(command) = self.undone.pop() {
            command.apply(planner, tour)?;
            self.done.push(command);
        }
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
}
