use std::collections::{BTreeMap, btree_map};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Channel memberships observed for a user, keyed by channel id. Values repeat the member id.
pub type ChannelMemberships = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: BTreeMap<String, Team>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channels: ChannelMemberships,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub member_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channels: ChannelMemberships,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Users(BTreeMap<String, User>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channels(BTreeMap<String, Channel>);

impl Teams {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Team> {
        self.teams.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.teams.keys().map(String::as_str)
    }

    /// Returns `false` when a team with that name already exists.
    pub fn create(&mut self, name: &str) -> bool {
        match self.teams.entry(name.to_owned()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(Team::default());
                true
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.teams.remove(name).is_some()
    }

    /// Copies a freshly observed name and channel membership onto every team member with
    /// `member_id`. Returns how many member records were touched.
    pub fn apply_observation(&mut self, member_id: &str, name: &str, channel_id: &str) -> usize {
        let mut touched = 0_usize;
        for member in self
            .teams
            .values_mut()
            .flat_map(|team| team.members.iter_mut())
            .filter(|member| member.member_id == member_id)
        {
            member.name = name.to_owned();
            member
                .channels
                .insert(channel_id.to_owned(), member_id.to_owned());
            touched = touched.saturating_add(1);
        }
        touched
    }
}

impl Team {
    #[must_use]
    pub fn has_member(&self, member_id: &str) -> bool {
        self.members
            .iter()
            .any(|member| member.member_id == member_id)
    }

    pub fn push_member(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Removes the first member with `member_id`, preserving the order of the rest.
    pub fn remove_member(&mut self, member_id: &str) -> Option<Member> {
        let index = self
            .members
            .iter()
            .position(|member| member.member_id == member_id)?;
        Some(self.members.remove(index))
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|member| member.member_id.as_str())
    }
}

impl Member {
    #[must_use]
    pub fn new(member_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            name: name.into(),
            channels: ChannelMemberships::new(),
        }
    }

    /// `name (id)`, or the bare id when no name has been resolved yet.
    #[must_use]
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.member_id.clone()
        } else {
            format!("{} ({})", self.name, self.member_id)
        }
    }
}

impl Users {
    #[must_use]
    pub fn get(&self, member_id: &str) -> Option<&User> {
        self.0.get(member_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces any entry for `member_id` with a fresh record that has no channel memberships.
    pub fn reset(&mut self, member_id: &str, name: &str, now: DateTime<Utc>) {
        self.0.insert(
            member_id.to_owned(),
            User {
                member_id: member_id.to_owned(),
                name: name.to_owned(),
                updated_at: now,
                channels: ChannelMemberships::new(),
            },
        );
    }

    /// Creates the entry for `member_id` or refreshes its name and timestamp. Channel memberships
    /// already recorded for the user are kept.
    pub fn upsert(&mut self, member_id: &str, name: &str, now: DateTime<Utc>) -> &mut User {
        let user = self
            .0
            .entry(member_id.to_owned())
            .or_insert_with(|| User {
                member_id: member_id.to_owned(),
                name: String::new(),
                updated_at: now,
                channels: ChannelMemberships::new(),
            });
        name.clone_into(&mut user.name);
        user.updated_at = now;
        user
    }

    /// [`Users::upsert`] plus recording that the user was seen in `channel_id`.
    pub fn record_observation(
        &mut self,
        member_id: &str,
        name: &str,
        channel_id: &str,
        now: DateTime<Utc>,
    ) {
        self.upsert(member_id, name, now)
            .channels
            .insert(channel_id.to_owned(), member_id.to_owned());
    }
}

impl Channels {
    #[must_use]
    pub fn contains(&self, channel_id: &str) -> bool {
        self.0.contains_key(channel_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, channel: Channel) {
        self.0.insert(channel.id.clone(), channel);
    }

    pub fn remove(&mut self, channel_id: &str) -> Option<Channel> {
        self.0.remove(channel_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(|channel| channel.name.as_str())
    }

    /// Linear scan in id order; the first channel whose name matches exactly wins. Names are not
    /// unique, so a duplicate name always resolves to the lowest channel id.
    #[must_use]
    pub fn find_id_by_name(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, channel)| channel.name == name)
            .map(|(id, _)| id.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
