use super::RecordStore;
use crate::error::StoreError;
use crate::records::{DrugInteraction, NewDrugInteraction, normalize_drug_name};

impl RecordStore {
    /// Register a known interaction; the pair must not already be known.
    pub fn add_drug_interaction(
        &self,
        new: NewDrugInteraction,
    ) -> Result<DrugInteraction, StoreError> {
        let interaction = DrugInteraction::from_new(new);
        self.create(&self.interactions, interaction, |known, candidate| {
            let duplicate = known
                .values()
                .any(|existing| existing.involves(&candidate.medication1, &candidate.medication2));
            if duplicate {
                return Err(StoreError::validation(format!(
                    "interaction already known: {} + {}",
                    candidate.medication1, candidate.medication2
                )));
            }
            Ok(())
        })
    }

    /// Known interactions among every pair of the given medication names.
    pub fn check_drug_interactions<S: AsRef<str>>(&self, names: &[S]) -> Vec<DrugInteraction> {
        let names: Vec<String> = names
            .iter()
            .map(|name| normalize_drug_name(name.as_ref()))
            .collect();
        let mut found = Vec::new();
        for (index, first) in names.iter().enumerate() {
            for second in &names[index + 1..] {
                if first == second {
                    continue;
                }
                if let Some(interaction) = self
                    .interactions
                    .find(|interaction| interaction.involves(first, second))
                    && !found
                        .iter()
                        .any(|seen: &DrugInteraction| seen.id == interaction.id)
                {
                    found.push(interaction);
                }
            }
        }
        found
    }
}
