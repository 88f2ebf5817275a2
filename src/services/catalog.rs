//! Catalog service: gated access to books and members, plus the book cache

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use validator::Validate;

use crate::{
    api::catalog::CatalogApi,
    error::AppResult,
    models::{Book, BookInput, BookStatus, Member, MemberInput},
};

use super::{
    events::{EntityEvent, EventBus},
    gate::{CapabilityGate, CATALOG_EDITORS},
    session::SessionStore,
};

struct CachedBook {
    book: Book,
    stale: bool,
}

#[derive(Default)]
struct CacheState {
    books: HashMap<String, CachedBook>,
    /// Advanced by every invalidation and authoritative write
    generation: u64,
}

/// Cache generation observed before a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTicket(u64);

/// Book snapshots keyed by id. Entries are marked stale rather than edited,
/// so the next read goes back to the server.
///
/// A fetched snapshot is only stored if the cache has not changed since its
/// ticket was taken; otherwise it may predate an invalidation.
#[derive(Default)]
pub struct BookCache {
    state: RwLock<CacheState>,
}

impl BookCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ticket(&self) -> CacheTicket {
        CacheTicket(self.state.read().await.generation)
    }

    /// Cached copy, only if it has not been invalidated
    pub async fn fresh(&self, id: &str) -> Option<Book> {
        self.state
            .read()
            .await
            .books
            .get(id)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.book.clone())
    }

    /// Missing entries count as stale
    pub async fn is_stale(&self, id: &str) -> bool {
        self.state
            .read()
            .await
            .books
            .get(id)
            .map_or(true, |entry| entry.stale)
    }

    /// Store the server's answer to a write
    pub async fn store(&self, book: Book) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state
            .books
            .insert(book.id.clone(), CachedBook { book, stale: false });
    }

    /// Store a read result unless the cache moved on since `ticket`
    pub async fn store_fetched(&self, ticket: CacheTicket, book: Book) -> bool {
        let mut state = self.state.write().await;
        if state.generation != ticket.0 {
            return false;
        }
        state
            .books
            .insert(book.id.clone(), CachedBook { book, stale: false });
        true
    }

    /// Replace every entry with a listing, unless the cache moved on since `ticket`
    pub async fn replace_all(&self, ticket: CacheTicket, books: &[Book]) -> bool {
        let mut state = self.state.write().await;
        if state.generation != ticket.0 {
            return false;
        }
        state.books = books
            .iter()
            .map(|book| {
                (
                    book.id.clone(),
                    CachedBook {
                        book: book.clone(),
                        stale: false,
                    },
                )
            })
            .collect();
        true
    }

    pub async fn invalidate(&self, id: &str) {
        let mut state = self.state.write().await;
        state.generation += 1;
        if let Some(entry) = state.books.get_mut(id) {
            entry.stale = true;
        }
    }

    pub async fn remove(&self, id: &str) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.books.remove(id);
    }
}

pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
    session: Arc<SessionStore>,
    cache: BookCache,
    events: EventBus,
}

impl CatalogService {
    pub fn new(api: Arc<dyn CatalogApi>, session: Arc<SessionStore>, events: EventBus) -> Self {
        Self {
            api,
            session,
            cache: BookCache::new(),
            events,
        }
    }

    pub fn cache(&self) -> &BookCache {
        &self.cache
    }

    /// All books; refreshes the cache
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        CapabilityGate::require_authenticated(&self.session.current(), "Browsing books")?;
        let ticket = self.cache.ticket().await;
        let books = self.api.list_books().await?;
        if !self.cache.replace_all(ticket, &books).await {
            tracing::debug!("Book listing predates a cache change, not cached");
        }
        Ok(books)
    }

    /// One book, from cache unless stale or missing
    pub async fn book(&self, id: &str) -> AppResult<Book> {
        CapabilityGate::require_authenticated(&self.session.current(), "Viewing a book")?;
        if let Some(book) = self.cache.fresh(id).await {
            return Ok(book);
        }
        tracing::debug!("Fetching book {}", id);
        let ticket = self.cache.ticket().await;
        let book = self.api.get_book(id).await?;
        if !self.cache.store_fetched(ticket, book.clone()).await {
            tracing::debug!("Book {} changed during the fetch, not cached", id);
        }
        Ok(book)
    }

    pub async fn book_status(&self, id: &str) -> AppResult<BookStatus> {
        self.book(id).await.map(|book| book.status)
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        CapabilityGate::require_authenticated(&self.session.current(), "Browsing members")?;
        self.api.list_members().await
    }

    pub async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        input.validate()?;
        CapabilityGate::require(&self.session.current(), CATALOG_EDITORS, "Adding books")?;
        let book = self.api.create_book(input).await?;
        tracing::info!("Book {} added", book.id);
        self.cache.store(book.clone()).await;
        self.events.publish(EntityEvent::BookChanged {
            book_id: book.id.clone(),
        });
        Ok(book)
    }

    pub async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Book> {
        input.validate()?;
        CapabilityGate::require(&self.session.current(), CATALOG_EDITORS, "Editing books")?;
        let book = self.api.update_book(id, input).await?;
        tracing::info!("Book {} updated", book.id);
        self.cache.store(book.clone()).await;
        self.events.publish(EntityEvent::BookChanged {
            book_id: book.id.clone(),
        });
        Ok(book)
    }

    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        CapabilityGate::require(&self.session.current(), CATALOG_EDITORS, "Deleting books")?;
        self.api.delete_book(id).await?;
        tracing::info!("Book {} deleted", id);
        self.cache.remove(id).await;
        self.events.publish(EntityEvent::BookDeleted {
            book_id: id.to_string(),
        });
        Ok(())
    }

    pub async fn create_member(&self, input: &MemberInput) -> AppResult<Member> {
        input.validate()?;
        CapabilityGate::require(&self.session.current(), CATALOG_EDITORS, "Adding members")?;
        let member = self.api.create_member(input).await?;
        tracing::info!("Member {} added", member.id);
        self.events.publish(EntityEvent::MemberChanged {
            member_id: member.id.clone(),
        });
        Ok(member)
    }

    pub async fn update_member(&self, id: &str, input: &MemberInput) -> AppResult<Member> {
        input.validate()?;
        CapabilityGate::require(&self.session.current(), CATALOG_EDITORS, "Editing members")?;
        let member = self.api.update_member(id, input).await?;
        tracing::info!("Member {} updated", member.id);
        self.events.publish(EntityEvent::MemberChanged {
            member_id: member.id.clone(),
        });
        Ok(member)
    }

    pub async fn delete_member(&self, id: &str) -> AppResult<()> {
        CapabilityGate::require(&self.session.current(), CATALOG_EDITORS, "Deleting members")?;
        self.api.delete_member(id).await?;
        tracing::info!("Member {} deleted", id);
        self.events.publish(EntityEvent::MemberDeleted {
            member_id: id.to_string(),
        });
        Ok(())
    }

    /// Mark a book stale after a server-side change and tell listeners
    pub async fn invalidate_book(&self, id: &str) {
        self.cache.invalidate(id).await;
        self.events.publish(EntityEvent::BookChanged {
            book_id: id.to_string(),
        });
    }
}
