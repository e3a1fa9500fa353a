//! 叠加图层
//!
//! 每个图层独占自己的配准参数和派生要素。修改参数时先校验、再重算，
//! 两步成功后才一并替换，失败时图层保持原状。
//!
//! 子图层可见性只是一张按图层名索引的布尔表，渲染时查询；
//! 切换可见性不会触发重算。

use crate::crs::CrsRegistry;
use crate::drawing::CadDrawing;
use crate::error::CoreResult;
use crate::feature::{FeatureCollection, GeoFeature};
use crate::georef::{AffineGeoConfig, GeoTransform};
use crate::math::GeoBounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 子图层可见性表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubLayerVisibility {
    table: BTreeMap<String, bool>,
}

impl SubLayerVisibility {
    /// 所有图层默认可见
    pub fn all_visible<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: names.into_iter().map(|n| (n.into(), true)).collect(),
        }
    }

    /// 表中没有的图层视为可见
    pub fn is_visible(&self, name: &str) -> bool {
        self.table.get(name).copied().unwrap_or(true)
    }

    pub fn set(&mut self, name: &str, visible: bool) {
        self.table.insert(name.to_string(), visible);
    }

    /// 切换可见性，返回切换后的状态
    pub fn toggle(&mut self, name: &str) -> bool {
        let visible = !self.is_visible(name);
        self.set(name, visible);
        visible
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// 要素是否应被渲染（无 `layer` 属性的要素总是可见）
    pub fn shows(&self, feature: &GeoFeature) -> bool {
        feature.layer().map_or(true, |layer| self.is_visible(layer))
    }
}

/// 图层数据来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerSource {
    /// CAD 图纸，要素由实体配准得到
    Cad(CadDrawing),
    /// 已是地理坐标的要素（如宗地查询结果），不参与配准
    GeoJson(FeatureCollection),
}

/// 叠加图层
#[derive(Debug, Clone)]
pub struct DrawingLayer {
    name: String,
    source: LayerSource,
    config: AffineGeoConfig,
    features: FeatureCollection,
    sub_layers: SubLayerVisibility,
    pub visible: bool,
}

impl DrawingLayer {
    /// 从已解析的图纸创建图层，立即执行首次配准
    pub fn from_drawing(
        registry: &CrsRegistry,
        name: impl Into<String>,
        drawing: CadDrawing,
        config: AffineGeoConfig,
    ) -> CoreResult<Self> {
        let transform = GeoTransform::new(registry, &config)?;
        let features = drawing.georeference(&transform);
        let sub_layers = SubLayerVisibility::all_visible(drawing.layer_names());

        Ok(Self {
            name: name.into(),
            source: LayerSource::Cad(drawing),
            config,
            features,
            sub_layers,
            visible: true,
        })
    }

    /// 从地理要素创建图层（配准参数保持恒等的 local 配置）
    pub fn from_features(name: impl Into<String>, features: FeatureCollection) -> Self {
        Self {
            name: name.into(),
            source: LayerSource::GeoJson(features.clone()),
            config: AffineGeoConfig::identity(crate::crs::LOCAL_ID),
            features,
            sub_layers: SubLayerVisibility::default(),
            visible: true,
        }
    }

    /// 从持久化的各部分恢复图层，CAD 图层重新配准
    pub fn restore(
        registry: &CrsRegistry,
        name: impl Into<String>,
        source: LayerSource,
        config: AffineGeoConfig,
        sub_layers: SubLayerVisibility,
        visible: bool,
    ) -> CoreResult<Self> {
        let features = match &source {
            LayerSource::Cad(drawing) => drawing.georeference(&GeoTransform::new(registry, &config)?),
            LayerSource::GeoJson(features) => features.clone(),
        };
        Ok(Self {
            name: name.into(),
            source,
            config,
            features,
            sub_layers,
            visible,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    pub fn config(&self) -> &AffineGeoConfig {
        &self.config
    }

    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    pub fn sub_layers(&self) -> &SubLayerVisibility {
        &self.sub_layers
    }

    pub fn sub_layers_mut(&mut self) -> &mut SubLayerVisibility {
        &mut self.sub_layers
    }

    pub fn is_cad(&self) -> bool {
        matches!(self.source, LayerSource::Cad(_))
    }

    /// 替换配准参数并重算要素
    ///
    /// 参数无效时返回错误，图层不变。GeoJSON 图层只记录参数。
    pub fn reconfigure(&mut self, registry: &CrsRegistry, config: AffineGeoConfig) -> CoreResult<()> {
        let transform = GeoTransform::new(registry, &config)?;
        if let LayerSource::Cad(drawing) = &self.source {
            self.features = drawing.georeference(&transform);
        }
        self.config = config;
        Ok(())
    }

    /// 基于当前参数修改后重算
    pub fn update_config(
        &mut self,
        registry: &CrsRegistry,
        change: impl FnOnce(&mut AffineGeoConfig),
    ) -> CoreResult<()> {
        let mut config = self.config.clone();
        change(&mut config);
        self.reconfigure(registry, config)
    }

    /// 渲染时可见的要素
    pub fn visible_features(&self) -> impl Iterator<Item = &GeoFeature> {
        let layer_visible = self.visible;
        self.features
            .iter()
            .filter(move |f| layer_visible && self.sub_layers.shows(f))
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.features.bounds()
    }
}
