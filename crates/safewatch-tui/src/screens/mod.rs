//! Screen components, one per [`ScreenId`].

mod alerts;
mod assignments;
mod incident;
mod overview;

use crate::component::Component;
use crate::screen::ScreenId;

pub use alerts::AlertsScreen;
pub use assignments::AssignmentsScreen;
pub use incident::IncidentScreen;
pub use overview::OverviewScreen;

/// Construct all screens for mounting into the app.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Alerts, Box::new(AlertsScreen::new())),
        (ScreenId::Assignments, Box::new(AssignmentsScreen::new())),
        (ScreenId::Overview, Box::new(OverviewScreen::new())),
        (ScreenId::Incident, Box::new(IncidentScreen::new())),
    ]
}
