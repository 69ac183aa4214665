use crate::config::KitchenConfig;

use kettle::time::sleep;
use kettle::{CancellationToken, ExclusiveResource, ResourceExhausted, TaskError};
use thiserror::Error;
use tracing::{info, warn};

/// # Errors that can spoil a ramen.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookingError {
    /// The kitchen ran out of water before the pot could be filled.
    #[error("out of water ({0})")]
    OutOfWater(#[from] ResourceExhausted),
}

/// A kitchen sharing one water supply between every pot.
///
/// Water is the only shared state; the cooking steps themselves only wait,
/// so any number of ramen can be on the stove at once.
#[derive(Debug)]
pub struct Kitchen {
    water: ExclusiveResource<u64>,
    config: KitchenConfig,
}

impl Kitchen {
    /// Opens a kitchen with `config.water_cups` cups of water.
    pub fn new(config: KitchenConfig) -> Self {
        Self {
            water: ExclusiveResource::new(config.water_cups),
            config,
        }
    }

    /// Settings the kitchen was opened with.
    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Cups of water left in the supply.
    pub async fn water_left(&self) -> u64 {
        self.water.read().await
    }

    /// Takes `cups` out of the supply and brings them to a boil.
    ///
    /// # Errors
    /// [`CookingError::OutOfWater`] if the supply is short; nothing is taken
    /// in that case.
    pub async fn boil_water(&self, ramen: u32, cups: u64) -> Result<(), CookingError> {
        let left = self.water.consume(cups).await?;
        info!(ramen, cups, water_left = left, "boiling water");

        sleep(self.config.steps.boil).await;
        info!(ramen, "water is boiling");
        Ok(())
    }

    /// Adds the soup base and flakes.
    pub async fn add_ingredients(&self, ramen: u32) {
        info!(ramen, "adding soup base and flakes");
        sleep(self.config.steps.ingredients).await;
    }

    /// Boils the noodles, the longest step.
    pub async fn cook_noodles(&self, ramen: u32) {
        info!(ramen, "cooking noodles");
        sleep(self.config.steps.noodles).await;
        info!(ramen, "noodles are done");
    }

    /// Cracks an egg on top.
    pub async fn add_egg(&self, ramen: u32) {
        info!(ramen, "cracking an egg");
        sleep(self.config.steps.egg).await;
    }

    /// Serves the ramen, e.g. `"ramen #3 is ready"`.
    pub fn finish(&self, ramen: u32) -> String {
        format!("ramen #{ramen} is ready")
    }
}

/// Runs every step of one ramen in order.
///
/// The token is checked between steps, so a cancelled ramen stops at the
/// next step boundary with [`TaskError::Cancelled`].
pub async fn cook_ramen(
    kitchen: &Kitchen,
    ramen: u32,
    token: &CancellationToken,
) -> Result<String, TaskError<CookingError>> {
    info!(ramen, "start cooking");

    kitchen
        .boil_water(ramen, kitchen.config.cups_per_ramen)
        .await
        .map_err(TaskError::Failed)?;
    token.checkpoint()?;

    kitchen.add_ingredients(ramen).await;
    token.checkpoint()?;

    kitchen.cook_noodles(ramen).await;
    token.checkpoint()?;

    kitchen.add_egg(ramen).await;
    Ok(kitchen.finish(ramen))
}

/// Cooks one ramen and logs the outcome instead of propagating it.
///
/// A failed ramen is skipped; the kitchen keeps serving the others.
pub async fn cook_single_ramen(
    kitchen: &Kitchen,
    ramen: u32,
    token: &CancellationToken,
) -> Result<String, TaskError<CookingError>> {
    let out = cook_ramen(kitchen, ramen, token).await;

    match &out {
        Ok(served) => info!("{served}"),
        Err(err) => warn!(ramen, kind = err.as_label(), error = %err, "ramen skipped"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_kitchen() -> Kitchen {
        Kitchen::new(KitchenConfig::default().scaled(0.001))
    }

    #[kettle::test]
    async fn one_ramen_uses_two_cups() {
        let kitchen = fast_kitchen();
        let token = CancellationToken::new();

        let served = cook_ramen(&kitchen, 1, &token).await;
        assert_eq!(served, Ok("ramen #1 is ready".to_string()));
        assert_eq!(kitchen.water_left().await, 8);
    }

    #[kettle::test]
    async fn shortage_leaves_the_water_alone() {
        let kitchen = fast_kitchen();

        let out = kitchen.boil_water(7, 100).await;
        assert_eq!(
            out,
            Err(CookingError::OutOfWater(ResourceExhausted {
                requested: 100,
                available: 10,
            }))
        );
        assert_eq!(kitchen.water_left().await, 10);
    }

    #[kettle::test]
    async fn cancelled_ramen_stops_after_boiling() {
        let kitchen = fast_kitchen();
        let token = CancellationToken::new();
        token.cancel();

        let out = cook_single_ramen(&kitchen, 3, &token).await;
        assert_eq!(out, Err(TaskError::Cancelled));

        // The water was already taken when the request was noticed.
        assert_eq!(kitchen.water_left().await, 8);
    }
}
