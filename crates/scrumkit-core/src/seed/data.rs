//! Demo content.

use chrono::{Duration, NaiveDate};

use crate::canvas::{
    ActionItem, ActionStatus, BusinessModelCanvas, GapAnalysis, GapItem, ProcessStep,
    ValuePropositionCanvas, ValueStreamMap,
};
use crate::common::Priority;
use crate::epic::model::NewEpic;
use crate::project::model::NewProject;
use crate::sprint::model::{NewSprint, SprintStatus};
use crate::story::model::{NewStory, StoryStatus};
use crate::team::model::{NewTeamMember, TeamRole};

/// A project with everything that gets created under it.
#[derive(Debug, Clone)]
pub struct DemoProject {
    pub project: NewProject,
    pub team: Vec<NewTeamMember>,
    pub sprints: Vec<DemoSprint>,
    pub epics: Vec<DemoEpic>,
}

impl DemoProject {
    pub fn story_count(&self) -> usize {
        self.epics.iter().map(|e| e.stories.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct DemoSprint {
    pub sprint: NewSprint,
    /// Status the sprint ends up in once its stories are assigned.
    pub status: SprintStatus,
}

#[derive(Debug, Clone)]
pub struct DemoEpic {
    pub epic: NewEpic,
    pub stories: Vec<DemoStory>,
}

#[derive(Debug, Clone)]
pub struct DemoStory {
    /// `epic_id` is filled in at seeding time.
    pub story: NewStory,
    /// Index into the project's `sprints`.
    pub sprint: Option<usize>,
}

/// The four demo canvases seeded for the first project.
#[derive(Debug, Clone)]
pub struct DemoCanvases {
    pub business_model: BusinessModelCanvas,
    pub value_proposition: ValuePropositionCanvas,
    pub value_stream: ValueStreamMap,
    pub gap_analysis: GapAnalysis,
}

fn epic(title: &str, description: &str, value: u8, effort: u8, priority: Priority) -> NewEpic {
    NewEpic {
        description: description.to_string(),
        business_value: value,
        effort,
        priority,
        ..NewEpic::new(title)
    }
}

fn story(title: &str, points: u32, status: StoryStatus, sprint: Option<usize>, criteria: &[&str]) -> DemoStory {
    DemoStory {
        story: NewStory {
            status,
            acceptance_criteria: criteria.iter().map(|c| c.to_string()).collect(),
            ..NewStory::new("", title).with_points(points)
        },
        sprint,
    }
}

fn member(name: &str, email: &str, role: TeamRole, capacity: u32) -> NewTeamMember {
    NewTeamMember {
        name: name.to_string(),
        email: email.to_string(),
        role,
        user_id: None,
        capacity: Some(capacity),
    }
}

/// Three two-week sprints around `today`: one finished, one running and
/// one planned.
fn sprints(today: NaiveDate, names: [&str; 3], goals: [&str; 3], capacity: u32) -> Vec<DemoSprint> {
    let starts = [today - Duration::days(21), today - Duration::days(7), today + Duration::days(7)];
    let statuses = [SprintStatus::Completed, SprintStatus::Active, SprintStatus::Planned];
    starts
        .iter()
        .zip(names)
        .zip(goals)
        .zip(statuses)
        .map(|(((start, name), goal), status)| DemoSprint {
            sprint: NewSprint {
                goal: goal.to_string(),
                capacity: Some(capacity),
                ..NewSprint::new(name, *start, *start + Duration::days(13))
            },
            status,
        })
        .collect()
}

/// Fixed demo data, with sprint dates relative to `today`.
pub fn demo_projects(today: NaiveDate) -> Vec<DemoProject> {
    use StoryStatus::{Done, InProgress, Review, Todo};

    vec![
        DemoProject {
            project: NewProject::new(
                "Online Bookstore",
                "E-commerce platform for independent bookshops",
            ),
            team: vec![
                member("Maria Santos", "maria@bookstore.example", TeamRole::ProductOwner, 5),
                member("John Carter", "john@bookstore.example", TeamRole::ScrumMaster, 5),
                member("Ana Lima", "ana@bookstore.example", TeamRole::Developer, 13),
                member("Peter Novak", "peter@bookstore.example", TeamRole::Developer, 13),
            ],
            sprints: sprints(
                today,
                ["Sprint 1", "Sprint 2", "Sprint 3"],
                [
                    "Customers can browse and search the catalog",
                    "Customers can buy books",
                    "Customers get order updates",
                ],
                30,
            ),
            epics: vec![
                DemoEpic {
                    epic: epic(
                        "Product catalog",
                        "Browse, search and view book details",
                        9,
                        5,
                        Priority::High,
                    ),
                    stories: vec![
                        story("List books by category", 5, Done, Some(0), &["Shows 20 books per page"]),
                        story("Search by title or author", 8, Done, Some(0), &["Partial matches are found"]),
                        story("Book detail page", 3, Done, Some(0), &["Shows price, synopsis and stock"]),
                    ],
                },
                DemoEpic {
                    epic: epic(
                        "Checkout",
                        "Cart, payment and order confirmation",
                        10,
                        8,
                        Priority::Critical,
                    ),
                    stories: vec![
                        story("Shopping cart", 5, Done, Some(1), &["Quantities can be changed"]),
                        story("Card payment", 8, InProgress, Some(1), &["Declined cards show a clear error"]),
                        story("Order confirmation email", 3, Review, Some(1), &[]),
                    ],
                },
                DemoEpic {
                    epic: epic(
                        "Order tracking",
                        "Let customers follow their deliveries",
                        6,
                        5,
                        Priority::Medium,
                    ),
                    stories: vec![
                        story("Order history page", 5, Todo, Some(2), &[]),
                        story("Shipping status notifications", 8, Todo, None, &[]),
                    ],
                },
            ],
        },
        DemoProject {
            project: NewProject::new("Fitness Tracker", "Mobile app for logging workouts and goals"),
            team: vec![
                member("Lucas Meyer", "lucas@fit.example", TeamRole::ProductOwner, 3),
                member("Sofia Rossi", "sofia@fit.example", TeamRole::Designer, 8),
                member("Daniel Kim", "daniel@fit.example", TeamRole::Developer, 13),
            ],
            sprints: sprints(
                today,
                ["Foundations", "Workouts", "Goals"],
                [
                    "Accounts and onboarding",
                    "Log and review workouts",
                    "Set and follow goals",
                ],
                21,
            ),
            epics: vec![
                DemoEpic {
                    epic: epic("Onboarding", "First-run experience", 7, 3, Priority::High),
                    stories: vec![
                        story("Sign up with email", 3, Done, Some(0), &["Password has at least 6 characters"]),
                        story("Profile setup wizard", 5, Done, Some(0), &[]),
                    ],
                },
                DemoEpic {
                    epic: epic("Workout log", "Record sets, reps and runs", 9, 6, Priority::High),
                    stories: vec![
                        story("Log a strength workout", 8, InProgress, Some(1), &["Sets can be duplicated"]),
                        story("Workout history chart", 5, Todo, Some(1), &[]),
                        story("Import runs from GPS file", 13, Todo, None, &[]),
                    ],
                },
            ],
        },
    ]
}

/// Demo canvases describing the bookstore.
pub fn demo_canvases() -> DemoCanvases {
    let mut gap_analysis = GapAnalysis {
        title: "Online sales readiness".into(),
        current_state: "Sales happen only in the physical store".into(),
        desired_state: "A third of revenue comes from online orders".into(),
        ..GapAnalysis::default()
    };
    let payments = gap_analysis.add_gap_item(GapItem {
        area: "Payments".into(),
        current: "Cash and card terminal only".into(),
        desired: "Online card payments".into(),
        gap: "No payment gateway".into(),
        priority: Priority::Critical,
        ..GapItem::default()
    });
    let logistics = gap_analysis.add_gap_item(GapItem {
        area: "Logistics".into(),
        current: "Customers pick up in store".into(),
        desired: "Nationwide delivery in 3 days".into(),
        gap: "No courier contract".into(),
        priority: Priority::High,
        ..GapItem::default()
    });
    let chosen = gap_analysis.add_action_item(ActionItem {
        description: "Choose a payment provider".into(),
        owner: "Maria Santos".into(),
        gap_item_id: Some(payments),
        ..ActionItem::default()
    });
    gap_analysis.set_action_status(&chosen, ActionStatus::Done);
    gap_analysis.add_action_item(ActionItem {
        description: "Request courier quotes".into(),
        owner: "John Carter".into(),
        status: ActionStatus::InProgress,
        gap_item_id: Some(logistics),
        ..ActionItem::default()
    });

    DemoCanvases {
        business_model: BusinessModelCanvas {
            key_partners: "Publishers, distributors, couriers".into(),
            key_activities: "Curating titles, running the web shop".into(),
            key_resources: "Catalog, shop staff, platform".into(),
            value_propositions: "Hand-picked books delivered fast".into(),
            customer_relationships: "Personal recommendations, newsletter".into(),
            channels: "Web shop, physical store, social media".into(),
            customer_segments: "Readers who value curation".into(),
            cost_structure: "Stock, shipping, hosting".into(),
            revenue_streams: "Book sales, gift cards".into(),
        },
        value_proposition: ValuePropositionCanvas {
            customer_jobs: vec!["Find the next good book".into(), "Buy a gift".into()],
            pains: vec!["Too many mediocre choices".into(), "Slow delivery".into()],
            gains: vec!["Trusted recommendations".into()],
            products_and_services: vec!["Curated web shop".into(), "Gift wrapping".into()],
            pain_relievers: vec!["Staff picks per genre".into(), "Three-day delivery".into()],
            gain_creators: vec!["Reading lists from booksellers".into()],
        },
        value_stream: ValueStreamMap {
            name: "Order to delivery".into(),
            description: "From placing an order to the book arriving".into(),
            steps: vec![
                ProcessStep::new("Order placed", 5.0, 0.0, true),
                ProcessStep::new("Payment check", 2.0, 30.0, false),
                ProcessStep::new("Picking and packing", 20.0, 240.0, true),
                ProcessStep::new("Courier pickup", 10.0, 720.0, false),
                ProcessStep::new("Delivery", 60.0, 1440.0, true),
            ],
        },
        gap_analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_demo_data_is_valid() {
        for demo in demo_projects(today()) {
            demo.project.validate().unwrap();
            for m in &demo.team {
                m.validate().unwrap();
            }
            for s in &demo.sprints {
                s.sprint.validate().unwrap();
            }
            for e in &demo.epics {
                e.epic.validate().unwrap();
                for s in &e.stories {
                    assert!(s.sprint.is_none_or(|i| i < demo.sprints.len()));
                }
            }
        }
    }

    #[test]
    fn test_sprints_surround_today() {
        let demo = &demo_projects(today())[0];
        let active = &demo.sprints[1].sprint;
        assert!(active.start_date <= today() && today() <= active.end_date);
        assert!(demo.sprints[0].sprint.end_date < active.start_date);
    }

    #[test]
    fn test_canvases_have_content() {
        let canvases = demo_canvases();
        assert_eq!(canvases.business_model.filled_blocks(), 9);
        assert_eq!(canvases.gap_analysis.completion_rate(), 0.5);
        assert!(canvases.value_stream.metrics().bottleneck.is_some());
    }
}
