//! 省 -> 区县 -> 坊社 三级联动选择.
//!
//! [`LocationState`] 只做同步状态迁移: 选择上级时先清空下级的选择和缓存, 再返回一个
//! [`FetchTicket`] 交给调用方去拉取下级列表. 拉取结果必须带着 ticket 回填,
//! 过期的 ticket 直接丢弃. [`LocationSelector`] 把状态机和 [`LocationSource`] 串起来.

use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::matcher::{find_unit, Level};
use crate::segments::{parse_segments, ParsedAddressSegments};
use crate::types::{AdministrativeUnit, District, Province, Ward};
use crate::GhnResult;

/// 行政区划基础数据来源
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn provinces(&self) -> GhnResult<Vec<Province>>;
    async fn districts(&self, province_id: i64) -> GhnResult<Vec<District>>;
    async fn wards(&self, district_id: i64) -> GhnResult<Vec<Ward>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTicket {
    Provinces { seq: u64 },
    Districts { province_id: i64, seq: u64 },
    Wards { district_id: i64, seq: u64 },
}

impl FetchTicket {
    pub fn level(&self) -> Level {
        match self {
            FetchTicket::Provinces { .. } => Level::Province,
            FetchTicket::Districts { .. } => Level::District,
            FetchTicket::Wards { .. } => Level::Ward,
        }
    }
}

/// 拉取失败的提示, 可以重试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNotice {
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// 该级列表为空(未加载或加载失败)
    Unavailable(Level),
    UnknownUnit(Level),
}

impl Display for LocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::Unavailable(level) => write!(f, "{} options are not available", level),
            LocationError::UnknownUnit(level) => write!(f, "unknown {}", level),
        }
    }
}

impl std::error::Error for LocationError {}

struct Options<U: AdministrativeUnit> {
    items: Vec<U>,
    selected: Option<U::Id>,
    revision: u64,
    pending: Option<FetchTicket>,
    // 上一次自动匹配时的 (地址片段, 列表版本)
    attempt: Option<(String, u64)>,
}

impl<U: AdministrativeUnit> Options<U> {
    fn new() -> Self {
        Options {
            items: Vec::new(),
            selected: None,
            revision: 0,
            pending: None,
            attempt: None,
        }
    }

    fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
        self.pending = None;
        self.attempt = None;
        self.revision += 1;
    }

    fn load(&mut self, items: Vec<U>) {
        self.items = items;
        self.pending = None;
        self.revision += 1;
    }

    fn check(&self, id: &U::Id, level: Level) -> Result<(), LocationError> {
        if self.items.is_empty() {
            return Err(LocationError::Unavailable(level));
        }
        if !self.items.iter().any(|item| &item.unit_id() == id) {
            return Err(LocationError::UnknownUnit(level));
        }

        Ok(())
    }

    /// 文本和列表都没变化时不再匹配; 命中的 id 与当前选择相同时也不返回
    fn auto_match(&mut self, text: &str, level: Level) -> Option<U::Id> {
        if self.items.is_empty() {
            return None;
        }

        let key = (text.to_string(), self.revision);
        if self.attempt.as_ref() == Some(&key) {
            return None;
        }
        self.attempt = Some(key);

        let id = find_unit(text, &self.items, level)?.unit_id();
        if self.selected.as_ref() == Some(&id) {
            return None;
        }

        debug!("auto select {} {:?} from {:?}", level, id, text);
        Some(id)
    }

    fn apply(
        &mut self,
        notice: &mut Option<LocationNotice>,
        ticket: FetchTicket,
        result: GhnResult<Vec<U>>,
    ) -> bool {
        if self.pending != Some(ticket) {
            debug!("discard stale response {:?}", ticket);
            return false;
        }

        let level = ticket.level();
        match result {
            Ok(items) => {
                self.load(items);
                if notice.as_ref().map(|n| n.level) == Some(level) {
                    *notice = None;
                }
            }
            Err(e) => {
                warn!("load {} options failed: {}", level, e);
                self.load(Vec::new());
                *notice = Some(LocationNotice {
                    level,
                    message: e.to_string(),
                });
            }
        }

        true
    }
}

pub struct LocationState {
    seq: u64,
    provinces: Options<Province>,
    districts: Options<District>,
    wards: Options<Ward>,
    notice: Option<LocationNotice>,
}

impl Default for LocationState {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationState {
    pub fn new() -> Self {
        LocationState {
            seq: 0,
            provinces: Options::new(),
            districts: Options::new(),
            wards: Options::new(),
            notice: None,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn clear_notice_below(&mut self, level: Level) {
        let below: &[Level] = match level {
            Level::Province => &[Level::District, Level::Ward],
            Level::District => &[Level::Ward],
            Level::Ward => &[],
        };
        if self
            .notice
            .as_ref()
            .map_or(false, |notice| below.contains(&notice.level))
        {
            self.notice = None;
        }
    }

    fn districts_ticket(&mut self, province_id: i64) -> FetchTicket {
        let ticket = FetchTicket::Districts {
            province_id,
            seq: self.next_seq(),
        };
        self.districts.pending = Some(ticket);
        ticket
    }

    fn wards_ticket(&mut self, district_id: i64) -> FetchTicket {
        let ticket = FetchTicket::Wards {
            district_id,
            seq: self.next_seq(),
        };
        self.wards.pending = Some(ticket);
        ticket
    }

    /// 省列表只需加载一次
    pub fn begin_provinces(&mut self) -> FetchTicket {
        let ticket = FetchTicket::Provinces {
            seq: self.next_seq(),
        };
        self.provinces.pending = Some(ticket);
        ticket
    }

    /// 选择省: 清空区县和坊社, 返回区县列表的拉取任务
    pub fn select_province(&mut self, id: i64) -> Result<Option<FetchTicket>, LocationError> {
        self.provinces.check(&id, Level::Province)?;
        if self.provinces.selected == Some(id) {
            return Ok(None);
        }

        self.provinces.selected = Some(id);
        self.districts.clear();
        self.wards.clear();
        self.clear_notice_below(Level::Province);

        Ok(Some(self.districts_ticket(id)))
    }

    /// 选择区县: 只清空坊社
    pub fn select_district(&mut self, id: i64) -> Result<Option<FetchTicket>, LocationError> {
        self.districts.check(&id, Level::District)?;
        if self.districts.selected == Some(id) {
            return Ok(None);
        }

        self.districts.selected = Some(id);
        self.wards.clear();
        self.clear_notice_below(Level::District);

        Ok(Some(self.wards_ticket(id)))
    }

    pub fn select_ward(&mut self, code: &str) -> Result<(), LocationError> {
        let code = code.to_string();
        self.wards.check(&code, Level::Ward)?;
        self.wards.selected = Some(code);

        Ok(())
    }

    pub fn apply_provinces(&mut self, ticket: FetchTicket, result: GhnResult<Vec<Province>>) -> bool {
        self.provinces.apply(&mut self.notice, ticket, result)
    }

    pub fn apply_districts(&mut self, ticket: FetchTicket, result: GhnResult<Vec<District>>) -> bool {
        self.districts.apply(&mut self.notice, ticket, result)
    }

    pub fn apply_wards(&mut self, ticket: FetchTicket, result: GhnResult<Vec<Ward>>) -> bool {
        self.wards.apply(&mut self.notice, ticket, result)
    }

    /// 按失败的层级重新生成拉取任务; 上级选择已经不存在时返回 None
    pub fn retry(&mut self) -> Option<FetchTicket> {
        let level = self.notice.as_ref()?.level;
        match level {
            Level::Province => Some(self.begin_provinces()),
            Level::District => {
                let province_id = self.provinces.selected?;
                Some(self.districts_ticket(province_id))
            }
            Level::Ward => {
                let district_id = self.districts.selected?;
                Some(self.wards_ticket(district_id))
            }
        }
    }

    /// 用地址片段自动选择, 每次最多推进一级联动.
    /// 返回联动需要的拉取任务; 返回 None 表示已经稳定.
    pub fn auto_select(&mut self, segments: &ParsedAddressSegments) -> Option<FetchTicket> {
        if let Some(text) = segments.province.as_deref() {
            if let Some(id) = self.provinces.auto_match(text, Level::Province) {
                if let Ok(Some(ticket)) = self.select_province(id) {
                    return Some(ticket);
                }
            }
        }

        if let Some(text) = segments.district.as_deref() {
            if let Some(id) = self.districts.auto_match(text, Level::District) {
                if let Ok(Some(ticket)) = self.select_district(id) {
                    return Some(ticket);
                }
            }
        }

        if let Some(text) = segments.ward.as_deref() {
            if let Some(code) = self.wards.auto_match(text, Level::Ward) {
                let _ = self.select_ward(&code);
            }
        }

        None
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces.items
    }

    pub fn districts(&self) -> &[District] {
        &self.districts.items
    }

    pub fn wards(&self) -> &[Ward] {
        &self.wards.items
    }

    pub fn selected_province(&self) -> Option<i64> {
        self.provinces.selected
    }

    pub fn selected_district(&self) -> Option<i64> {
        self.districts.selected
    }

    pub fn selected_ward(&self) -> Option<&str> {
        self.wards.selected.as_deref()
    }

    pub fn notice(&self) -> Option<&LocationNotice> {
        self.notice.as_ref()
    }
}

/// 联动选择器: 状态机 + 数据来源
pub struct LocationSelector<S> {
    source: S,
    state: LocationState,
}

impl<S: LocationSource> LocationSelector<S> {
    pub fn new(source: S) -> Self {
        LocationSelector {
            source,
            state: LocationState::new(),
        }
    }

    pub fn state(&self) -> &LocationState {
        &self.state
    }

    async fn fetch(&mut self, ticket: FetchTicket) -> bool {
        match ticket {
            FetchTicket::Provinces { .. } => {
                let result = self.source.provinces().await;
                self.state.apply_provinces(ticket, result)
            }
            FetchTicket::Districts { province_id, .. } => {
                let result = self.source.districts(province_id).await;
                self.state.apply_districts(ticket, result)
            }
            FetchTicket::Wards { district_id, .. } => {
                let result = self.source.wards(district_id).await;
                self.state.apply_wards(ticket, result)
            }
        }
    }

    pub async fn load_provinces(&mut self) {
        let ticket = self.state.begin_provinces();
        self.fetch(ticket).await;
    }

    pub async fn select_province(&mut self, id: i64) -> Result<(), LocationError> {
        if let Some(ticket) = self.state.select_province(id)? {
            self.fetch(ticket).await;
        }

        Ok(())
    }

    pub async fn select_district(&mut self, id: i64) -> Result<(), LocationError> {
        if let Some(ticket) = self.state.select_district(id)? {
            self.fetch(ticket).await;
        }

        Ok(())
    }

    pub fn select_ward(&mut self, code: &str) -> Result<(), LocationError> {
        self.state.select_ward(code)
    }

    /// 解析地址并自动完成三级选择, 直到联动稳定
    pub async fn resolve(&mut self, address: &str) -> ParsedAddressSegments {
        let segments = parse_segments(address);
        if self.state.provinces().is_empty() {
            self.load_provinces().await;
        }

        while let Some(ticket) = self.state.auto_select(&segments) {
            self.fetch(ticket).await;
        }

        segments
    }

    /// 用户手动重试上次失败的层级
    pub async fn retry(&mut self) -> bool {
        match self.state.retry() {
            Some(ticket) => self.fetch(ticket).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::GhnError;

    fn province(id: i64, name: &str) -> Province {
        Province {
            province_id: id,
            province_name: name.to_string(),
            name_extension: vec![],
        }
    }

    fn district(id: i64, province_id: i64, name: &str) -> District {
        District {
            district_id: id,
            province_id,
            district_name: name.to_string(),
            name_extension: vec![],
        }
    }

    fn ward(code: &str, district_id: i64, name: &str) -> Ward {
        Ward {
            ward_code: code.to_string(),
            district_id,
            ward_name: name.to_string(),
            name_extension: vec![],
        }
    }

    struct MockSource {
        provinces: Vec<Province>,
        districts: HashMap<i64, Vec<District>>,
        wards: HashMap<i64, Vec<Ward>>,
        fail_districts: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            MockSource {
                provinces: vec![province(201, "Hà Nội"), province(202, "Hồ Chí Minh")],
                districts: HashMap::from([
                    (
                        202,
                        vec![district(1452, 202, "Quận 10"), district(1442, 202, "Quận 1")],
                    ),
                    (201, vec![district(1485, 201, "Quận Cầu Giấy")]),
                ]),
                wards: HashMap::from([
                    (
                        1442,
                        vec![ward("20101", 1442, "Phường Bến Nghé"), ward("20102", 1442, "Phường Đa Kao")],
                    ),
                    (1485, vec![ward("1A0807", 1485, "Phường Dịch Vọng")]),
                ]),
                fail_districts: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LocationSource for MockSource {
        async fn provinces(&self) -> GhnResult<Vec<Province>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.provinces.clone())
        }

        async fn districts(&self, province_id: i64) -> GhnResult<Vec<District>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_districts.load(Ordering::SeqCst) {
                return Err(GhnError::Http("connection reset".to_string()));
            }
            Ok(self.districts.get(&province_id).cloned().unwrap_or_default())
        }

        async fn wards(&self, district_id: i64) -> GhnResult<Vec<Ward>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.wards.get(&district_id).cloned().unwrap_or_default())
        }
    }

    fn loaded_state() -> LocationState {
        let source = MockSource::new();
        let mut state = LocationState::new();
        let ticket = state.begin_provinces();
        assert!(state.apply_provinces(ticket, Ok(source.provinces.clone())));
        state
    }

    #[test]
    fn changing_province_clears_lower_levels_before_fetch() {
        let source = MockSource::new();
        let mut state = loaded_state();

        let ticket = state.select_province(202).unwrap().unwrap();
        state.apply_districts(ticket, Ok(source.districts[&202].clone()));
        let ticket = state.select_district(1442).unwrap().unwrap();
        state.apply_wards(ticket, Ok(source.wards[&1442].clone()));
        state.select_ward("20101").unwrap();
        assert_eq!(state.selected_ward(), Some("20101"));

        let ticket = state.select_province(201).unwrap().unwrap();
        assert!(matches!(
            ticket,
            FetchTicket::Districts {
                province_id: 201,
                ..
            }
        ));
        assert_eq!(state.selected_district(), None);
        assert_eq!(state.selected_ward(), None);
        assert!(state.districts().is_empty());
        assert!(state.wards().is_empty());
    }

    #[test]
    fn changing_district_keeps_province() {
        let source = MockSource::new();
        let mut state = loaded_state();

        let ticket = state.select_province(202).unwrap().unwrap();
        state.apply_districts(ticket, Ok(source.districts[&202].clone()));
        let ticket = state.select_district(1442).unwrap().unwrap();
        state.apply_wards(ticket, Ok(source.wards[&1442].clone()));

        assert!(state.select_district(1452).unwrap().is_some());
        assert_eq!(state.selected_province(), Some(202));
        assert_eq!(state.districts().len(), 2);
        assert!(state.wards().is_empty());
    }

    #[test]
    fn reselecting_same_unit_is_noop() {
        let mut state = loaded_state();
        assert!(state.select_province(202).unwrap().is_some());
        assert_eq!(state.select_province(202), Ok(None));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let source = MockSource::new();
        let mut state = loaded_state();

        let first = state.select_province(202).unwrap().unwrap();
        let second = state.select_province(201).unwrap().unwrap();

        assert!(!state.apply_districts(first, Ok(source.districts[&202].clone())));
        assert!(state.districts().is_empty());

        assert!(state.apply_districts(second, Ok(source.districts[&201].clone())));
        assert_eq!(state.districts()[0].district_id, 1485);
    }

    #[test]
    fn lower_levels_unselectable_without_options() {
        let mut state = LocationState::new();
        assert_eq!(
            state.select_province(202),
            Err(LocationError::Unavailable(Level::Province))
        );

        let mut state = loaded_state();
        assert_eq!(
            state.select_province(999),
            Err(LocationError::UnknownUnit(Level::Province))
        );
        state.select_province(202).unwrap();
        assert_eq!(
            state.select_district(1442),
            Err(LocationError::Unavailable(Level::District))
        );
    }

    #[test]
    fn auto_select_does_not_override_manual_choice() {
        let source = MockSource::new();
        let mut state = loaded_state();
        let segments = parse_segments("12 Lê Lợi, Phường Bến Nghé, Quận 1, TP HCM");

        let ticket = state.auto_select(&segments).unwrap();
        assert_eq!(state.selected_province(), Some(202));
        state.apply_districts(ticket, Ok(source.districts[&202].clone()));

        let ticket = state.auto_select(&segments).unwrap();
        assert_eq!(state.selected_district(), Some(1442));
        state.apply_wards(ticket, Ok(source.wards[&1442].clone()));

        assert_eq!(state.auto_select(&segments), None);
        assert_eq!(state.selected_ward(), Some("20101"));

        // 用户手动改了坊社, 地址文本没变, 不会被改回去
        state.select_ward("20102").unwrap();
        assert_eq!(state.auto_select(&segments), None);
        assert_eq!(state.selected_ward(), Some("20102"));
    }

    #[tokio::test]
    async fn resolve_runs_full_cascade() {
        let mut selector = LocationSelector::new(MockSource::new());
        let segments = selector
            .resolve("Số 1 Xuân Thủy, Phường Dịch Vọng, Quận Cầu Giấy, Hà Nội")
            .await;

        assert_eq!(segments.district.as_deref(), Some("Quận Cầu Giấy"));
        let state = selector.state();
        assert_eq!(state.selected_province(), Some(201));
        assert_eq!(state.selected_district(), Some(1485));
        assert_eq!(state.selected_ward(), Some("1A0807"));
        assert!(state.notice().is_none());
    }

    #[tokio::test]
    async fn resolve_stops_at_unknown_district() {
        let mut selector = LocationSelector::new(MockSource::new());
        selector.resolve("Phường 3, Quận 7, Hồ Chí Minh").await;

        let state = selector.state();
        assert_eq!(state.selected_province(), Some(202));
        assert_eq!(state.selected_district(), None);
        assert_eq!(state.selected_ward(), None);
        // 省 + 区县, 没有拉取坊社
        assert_eq!(selector.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_retryable() {
        let source = MockSource::new();
        source.fail_districts.store(true, Ordering::SeqCst);
        let mut selector = LocationSelector::new(source);
        selector.load_provinces().await;
        selector.select_province(202).await.unwrap();

        let notice = selector.state().notice().unwrap();
        assert_eq!(notice.level, Level::District);
        assert!(selector.state().districts().is_empty());
        assert_eq!(
            selector.select_district(1442).await,
            Err(LocationError::Unavailable(Level::District))
        );

        selector.source.fail_districts.store(false, Ordering::SeqCst);
        assert!(selector.retry().await);
        assert!(selector.state().notice().is_none());
        assert_eq!(selector.state().districts().len(), 2);
        selector.select_district(1442).await.unwrap();
        assert_eq!(selector.state().wards().len(), 2);
    }
}
