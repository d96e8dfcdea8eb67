//! Client-side view of a group, kept current by applying server events.
//!
//! `member_updated` is a full replace keyed by member id, so events for
//! different members may arrive in any order. `member_left` is final: a
//! late `member_updated` for the same id does not bring the member back.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{MemberView, Message, Ping, ServerEvent};

#[derive(Debug, Clone, Default)]
pub struct GroupView {
    viewer: Option<Uuid>,
    members: HashMap<Uuid, MemberView>,
    departed: HashSet<Uuid>,
    messages: Vec<Message>,
    pings: Vec<Ping>,
}

impl GroupView {
    /// A view seen through the eyes of `viewer`.
    pub fn new(viewer: Uuid) -> Self {
        Self {
            viewer: Some(viewer),
            ..Self::default()
        }
    }

    /// Loads the initial member listing.
    pub fn seed(&mut self, members: impl IntoIterator<Item = MemberView>) {
        for view in members {
            if !self.departed.contains(&view.id()) {
                self.members.insert(view.id(), view);
            }
        }
    }

    /// Applies one event. Returns false if the event was ignored.
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::MemberUpdated { member } => {
                if self.departed.contains(&member.id()) {
                    return false;
                }
                self.members.insert(member.id(), member.clone());
                true
            }
            ServerEvent::MemberLeft { member_id } => {
                self.departed.insert(*member_id);
                self.members.remove(member_id);
                true
            }
            ServerEvent::NewMessage { message } => {
                self.messages.push(message.clone());
                true
            }
            ServerEvent::NewPing { ping } => {
                let relevant = match self.viewer {
                    Some(viewer) => ping.from_member_id != viewer && ping.is_addressed_to(viewer),
                    None => true,
                };
                if relevant {
                    self.pings.push(ping.clone());
                }
                relevant
            }
        }
    }

    pub fn member(&self, id: Uuid) -> Option<&MemberView> {
        self.members.get(&id)
    }

    /// Members ordered by name.
    pub fn members(&self) -> Vec<&MemberView> {
        let mut members: Vec<&MemberView> = self.members.values().collect();
        members.sort_by(|a, b| a.member.name.cmp(&b.member.name));
        members
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Pings this viewer should be alerted about.
    pub fn pings(&self) -> &[Ping] {
        &self.pings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, MemberStatus, MessageType};
    use chrono::Utc;

    fn view(id: Uuid, name: &str, status: MemberStatus) -> MemberView {
        Member {
            id,
            group_id: Uuid::nil(),
            name: name.to_string(),
            status,
            latitude: None,
            longitude: None,
            last_seen: Utc::now(),
            location_sharing: true,
            ping_enabled: true,
            connection_handle: None,
        }
        .into()
    }

    fn ping(from: Uuid, to: Option<Uuid>) -> ServerEvent {
        ServerEvent::NewPing {
            ping: Ping {
                id: Uuid::new_v4(),
                group_id: Uuid::nil(),
                from_member_id: from,
                to_member_id: to,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_member_updated_replaces() {
        let mut gv = GroupView::new(Uuid::new_v4());
        let bob = Uuid::new_v4();

        assert!(gv.apply(&ServerEvent::MemberUpdated {
            member: view(bob, "Bob", MemberStatus::Active),
        }));
        assert!(gv.apply(&ServerEvent::MemberUpdated {
            member: view(bob, "Bob", MemberStatus::Offline),
        }));

        assert_eq!(gv.members().len(), 1);
        assert_eq!(gv.member(bob).unwrap().member.status, MemberStatus::Offline);
    }

    #[test]
    fn test_member_left_is_final() {
        let mut gv = GroupView::new(Uuid::new_v4());
        let bob = Uuid::new_v4();
        gv.seed(vec![view(bob, "Bob", MemberStatus::Active)]);

        assert!(gv.apply(&ServerEvent::MemberLeft { member_id: bob }));
        assert!(gv.member(bob).is_none());

        // a late update that raced the leave
        assert!(!gv.apply(&ServerEvent::MemberUpdated {
            member: view(bob, "Bob", MemberStatus::Active),
        }));
        assert!(gv.member(bob).is_none());

        gv.seed(vec![view(bob, "Bob", MemberStatus::Active)]);
        assert!(gv.member(bob).is_none());
    }

    #[test]
    fn test_members_sorted_by_name() {
        let mut gv = GroupView::default();
        gv.seed(vec![
            view(Uuid::new_v4(), "Carol", MemberStatus::Active),
            view(Uuid::new_v4(), "Alice", MemberStatus::Active),
            view(Uuid::new_v4(), "Bob", MemberStatus::Paused),
        ]);
        let names: Vec<&str> = gv.members().iter().map(|m| m.member.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_pings_filtered_for_viewer() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut gv = GroupView::new(me);

        assert!(gv.apply(&ping(other, None)));
        assert!(gv.apply(&ping(other, Some(me))));
        assert!(!gv.apply(&ping(other, Some(Uuid::new_v4()))));
        assert!(!gv.apply(&ping(me, None)));

        assert_eq!(gv.pings().len(), 2);
    }

    #[test]
    fn test_messages_appended() {
        let mut gv = GroupView::default();
        let event = ServerEvent::NewMessage {
            message: Message {
                id: Uuid::new_v4(),
                group_id: Uuid::nil(),
                member_id: Uuid::new_v4(),
                content: "On my way".to_string(),
                message_type: MessageType::QuickMessage,
                created_at: Utc::now(),
            },
        };
        gv.apply(&event);
        gv.apply(&event);
        assert_eq!(gv.messages().len(), 2);
        assert_eq!(gv.messages()[0].content, "On my way");
    }
}
