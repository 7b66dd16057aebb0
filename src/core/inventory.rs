use crate::core::game::GameService;
use crate::domain::model::{InventoryEntry, UserId};
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryPage {
    pub owner: UserId,
    pub entry: InventoryEntry,
    /// Zero-based position after wrap-around.
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryStep {
    NotOwner,
    Expired,
    Empty,
    Page(GalleryPage),
}

impl GameService {
    /// 索引超出範圍時環繞 (上一張 / 下一張)
    pub fn gallery_page(&self, owner: UserId, index: i64) -> Result<Option<GalleryPage>> {
        let mut entries = self.store.inventory(owner)?;
        if entries.is_empty() {
            return Ok(None);
        }
        let total = entries.len();
        let index = index.rem_euclid(total as i64) as usize;
        let entry = entries.swap_remove(index);
        Ok(Some(GalleryPage {
            owner,
            entry,
            index,
            total,
        }))
    }

    /// Page turn from a gallery button issued at `issued_ts`.
    pub fn gallery_step(
        &self,
        actor: UserId,
        owner: UserId,
        index: i64,
        issued_ts: i64,
    ) -> Result<GalleryStep> {
        if actor != owner {
            return Ok(GalleryStep::NotOwner);
        }
        if self.clock.now() - issued_ts > self.rules.view_timeout_seconds {
            return Ok(GalleryStep::Expired);
        }
        Ok(match self.gallery_page(owner, index)? {
            Some(page) => GalleryStep::Page(page),
            None => GalleryStep::Empty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::GameRules;
    use crate::core::game::test_support::*;
    use crate::domain::model::Rarity;
    use crate::domain::ports::Clock;

    fn setup() -> (GameService, std::sync::Arc<FixedClock>) {
        let (service, clock) = service_with(
            &[
                card("a", Rarity::Common),
                card("b", Rarity::Legendary),
                card("c", Rarity::Rare),
            ],
            GameRules::default(),
        );
        for id in ["a", "b", "c", "c"] {
            service.store().add_to_inventory(5, id).unwrap();
        }
        (service, clock)
    }

    #[test]
    fn test_gallery_wraps_around() {
        let (service, _) = setup();
        let first = service.gallery_page(5, 0).unwrap().unwrap();
        assert_eq!(first.entry.card.id, "b");
        assert_eq!(first.total, 3);

        let last = service.gallery_page(5, -1).unwrap().unwrap();
        assert_eq!(last.index, 2);
        assert_eq!(last.entry.card.id, "a");

        let wrapped = service.gallery_page(5, 3).unwrap().unwrap();
        assert_eq!(wrapped.index, 0);

        let rare = service.gallery_page(5, 1).unwrap().unwrap();
        assert_eq!(rare.entry.qty, 2);
    }

    #[test]
    fn test_empty_inventory() {
        let (service, _) = setup();
        assert!(service.gallery_page(6, 0).unwrap().is_none());
    }

    #[test]
    fn test_gallery_step_guards() {
        let (service, clock) = setup();
        let now = clock.now();
        assert_eq!(
            service.gallery_step(9, 5, 1, now).unwrap(),
            GalleryStep::NotOwner
        );
        assert_eq!(
            service.gallery_step(5, 5, 1, now - 500).unwrap(),
            GalleryStep::Expired
        );
        assert!(matches!(
            service.gallery_step(5, 5, 1, now).unwrap(),
            GalleryStep::Page(GalleryPage { index: 1, .. })
        ));
    }
}
