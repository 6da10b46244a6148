//! Client state: the five domain caches, built once and passed by reference.

use crate::config::AdminConfig;
use crate::domains::{
    Activity, ActivityCache, ActivityViews, BalanceCache, BalanceViews, Balances, ExpenseCache,
    ExpenseViews, Expenses, GroupCache, Groups, MemberCache, MemberViews, Users,
};
use crate::error::ClientResult;
use crate::notifications::NotificationCenter;
use crate::transport::RestTransport;
use divvy_cache::{
    ErrorSignal, FanoutReporter, IntoResourceKey, LoadError, Reporter, TracingReporter, Transport,
};
use divvy_core::{ActivityEntry, Balance, Expense, Member};
use std::sync::Arc;

/// One transport per domain.
#[derive(Clone)]
pub struct DomainTransports {
    pub activity: Arc<dyn Transport<Activity>>,
    pub balances: Arc<dyn Transport<Balances>>,
    pub expenses: Arc<dyn Transport<Expenses>>,
    pub groups: Arc<dyn Transport<Groups>>,
    pub users: Arc<dyn Transport<Users>>,
}

impl DomainTransports {
    /// Every domain served by the same transport.
    pub fn shared<T>(transport: Arc<T>) -> Self
    where
        T: Transport<Activity>
            + Transport<Balances>
            + Transport<Expenses>
            + Transport<Groups>
            + Transport<Users>
            + 'static,
    {
        Self {
            activity: transport.clone(),
            balances: transport.clone(),
            expenses: transport.clone(),
            groups: transport.clone(),
            users: transport,
        }
    }
}

/// The data behind a group's overview screen.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDashboard {
    pub balances: Vec<Balance>,
    pub expenses: Vec<Expense>,
    pub members: Vec<Member>,
    pub activity: Vec<ActivityEntry>,
}

/// The admin client's caches and their shared error surfaces.
///
/// All caches report to one [`ErrorSignal`] and one [`NotificationCenter`],
/// so the latest failure of any domain is what the user sees.
pub struct AdminCaches {
    pub activity: ActivityCache,
    pub balances: BalanceCache,
    pub expenses: ExpenseCache,
    pub groups: GroupCache,
    pub users: MemberCache,
    pub errors: ErrorSignal,
    pub notifications: Arc<NotificationCenter>,
    page_size: usize,
}

impl AdminCaches {
    /// Caches backed by the REST API described by `config`.
    pub fn from_config(config: &AdminConfig) -> ClientResult<Self> {
        let transport = Arc::new(RestTransport::new(config)?);
        Ok(Self::new(config, DomainTransports::shared(transport)))
    }

    pub fn new(config: &AdminConfig, transports: DomainTransports) -> Self {
        let errors = ErrorSignal::new();
        let notifications = Arc::new(NotificationCenter::default());
        let reporter: Arc<dyn Reporter> = Arc::new(
            FanoutReporter::new()
                .with(Arc::new(TracingReporter))
                .with(Arc::new(errors.clone()))
                .with(notifications.clone()),
        );
        let capacities = &config.cache;

        Self {
            activity: ActivityCache::new(
                config.cache_config(capacities.activity, true),
                transports.activity,
                reporter.clone(),
            ),
            balances: BalanceCache::new(
                config.cache_config(capacities.balances, false),
                transports.balances,
                reporter.clone(),
            ),
            expenses: ExpenseCache::new(
                config.cache_config(capacities.expenses, true),
                transports.expenses,
                reporter.clone(),
            ),
            groups: GroupCache::new(
                config.cache_config(capacities.groups, false),
                transports.groups,
                reporter.clone(),
            ),
            users: MemberCache::new(
                config.cache_config(capacities.users, false),
                transports.users,
                reporter,
            ),
            errors,
            notifications,
            page_size: config.pagination.page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The user-visible error shared by every cache.
    pub fn current_error(&self) -> Option<String> {
        self.errors.current()
    }

    /// Load everything a group's overview shows, concurrently.
    ///
    /// Fails with the first domain error. Domains that failed transiently
    /// after an earlier success still contribute their last items.
    pub async fn load_group_dashboard(
        &self,
        group_id: impl IntoResourceKey + Copy,
    ) -> Result<GroupDashboard, LoadError> {
        let (balances, expenses, members, activity) = futures_util::join!(
            self.balances.balances_for_group(group_id),
            self.expenses.expenses_for_group(group_id),
            self.users.members_for_group(group_id),
            self.activity.activity_for_group(group_id),
        );
        Ok(GroupDashboard {
            balances: balances?.items,
            expenses: expenses?.items,
            members: members?.items,
            activity: activity?.items,
        })
    }
}

impl std::fmt::Debug for AdminCaches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCaches")
            .field("activity", &self.activity)
            .field("balances", &self.balances)
            .field("expenses", &self.expenses)
            .field("groups", &self.groups)
            .field("users", &self.users)
            .field("page_size", &self.page_size)
            .finish()
    }
}
