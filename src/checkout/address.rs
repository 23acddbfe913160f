//! Address Resolver: settles on exactly one shipping address before payment.

use tracing::{info, instrument, warn};

use super::CheckoutBackend;
use crate::domain::aggregates::{Address, NewAddress};
use crate::session::{Action, AppState};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressSelection {
    Saved(String),
    /// Sentinel for "enter a new address"; the form is shown.
    New,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressResolver {
    selection: AddressSelection,
    /// Set once the user picks; until then the default follows the saved list.
    chosen: bool,
}

impl AddressResolver {
    /// Defaults to the first saved address, or to the new-address form when there are none.
    pub fn new(saved: &[Address]) -> Self {
        let selection = saved.first().map_or(AddressSelection::New, |a| AddressSelection::Saved(a.id.clone()));
        Self { selection, chosen: false }
    }

    /// Re-derives the default from `saved` unless the user has already picked,
    /// so addresses that load after the flow was created are still offered.
    pub fn refresh(&mut self, saved: &[Address]) {
        if !self.chosen {
            *self = Self::new(saved);
        }
    }

    pub fn selection(&self) -> &AddressSelection { &self.selection }
    pub fn shows_new_form(&self) -> bool { self.selection == AddressSelection::New }

    pub fn select(&mut self, saved: &[Address], address_id: &str) -> Result<()> {
        if !saved.iter().any(|a| a.id == address_id) {
            return Err(StorefrontError::AddressRequired);
        }
        self.selection = AddressSelection::Saved(address_id.to_string());
        self.chosen = true;
        Ok(())
    }

    pub fn choose_new(&mut self) {
        self.selection = AddressSelection::New;
        self.chosen = true;
    }

    pub fn resolve<'a>(&self, saved: &'a [Address]) -> Option<&'a Address> {
        match &self.selection {
            AddressSelection::Saved(id) => saved.iter().find(|a| &a.id == id),
            AddressSelection::New => None,
        }
    }

    /// Validates the form locally, then saves it. The saved address becomes the selection.
    #[instrument(skip(self, backend, state, form))]
    pub async fn submit_new(&mut self, backend: &dyn CheckoutBackend, state: &mut AppState, form: &NewAddress) -> Result<Address> {
        let user_id = state.user().map(|u| u.id.clone()).ok_or(StorefrontError::LoginRequired)?;
        form.check().map_err(StorefrontError::Validation)?;

        let created = backend.add_address(&user_id, form).await.map_err(|e| {
            warn!("Address rejected: {}", e);
            e
        })?;
        let address = created.address;
        info!(address_id = %address.id, "Address saved");
        state.apply(Action::AddressAdded(address.clone()));
        self.selection = AddressSelection::Saved(address.id.clone());
        self.chosen = true;
        Ok(address)
    }
}
