// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::iter::FromIterator;

use bytes::Bytes;

use crate::{policy::ConflictPolicy, record::NsId};

/// Static description of one namespace, as configured at startup.
#[derive(Clone, Debug)]
pub struct Namespace {
    pub id: NsId,
    /// Wire name. Peers resolve namespaces by name, never by id, so that
    /// nodes running different software versions agree on the table-space.
    pub name: Bytes,
    pub policy: ConflictPolicy,
}

/// Namespace registry handed to the resolver at construction.
///
/// Ids and names must be unique; namespaces cannot be added or removed while
/// the node runs.
#[derive(Clone, Debug, Default)]
pub struct Namespaces(Vec<Namespace>);

impl Namespaces {
    pub fn new(namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        let namespaces = namespaces.into_iter().collect::<Vec<_>>();
        debug_assert!(
            namespaces
                .iter()
                .enumerate()
                .all(|(i, ns)| namespaces[..i]
                    .iter()
                    .all(|prev| prev.id != ns.id && prev.name != ns.name)),
            "duplicate namespace id or name"
        );

        Self(namespaces)
    }

    pub fn by_id(&self, id: NsId) -> Option<&Namespace> {
        self.0.iter().find(|ns| ns.id == id)
    }

    pub fn by_name(&self, name: &[u8]) -> Option<&Namespace> {
        self.0.iter().find(|ns| ns.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.0.iter()
    }
}

impl FromIterator<Namespace> for Namespaces {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Namespace>,
    {
        Self::new(iter)
    }
}
