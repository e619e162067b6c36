//! Common test fixtures for WMS client tests.
//!
//! Capability documents cover both schemas plus a few malformed or
//! degenerate variants used to exercise the negotiator's validation.

/// Common bounding box definitions for testing.
pub mod bbox {
    /// Global WGS84 extent
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Small box around Bonn (WGS84)
    pub const BONN: (f64, f64, f64, f64) = (7.0, 50.6, 7.2, 50.8);

    /// Box in the southern hemisphere (WGS84, Cape Town)
    pub const CAPE_TOWN: (f64, f64, f64, f64) = (18.3, -34.0, 18.5, -33.8);

    /// Outside the extent advertised by [`super::capabilities::BASIC`]
    pub const OUT_OF_RANGE: (f64, f64, f64, f64) = (170.0, 80.0, 190.0, 95.0);
}

/// Capability documents.
pub mod capabilities {
    /// Minimal WMS 1.1.1 document: formats png and jpeg, layers `base`
    /// (style `default`) and `roads` (styles `default`, `night`), boxes for
    /// EPSG 4326 and 3857.
    pub const BASIC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMT_MS_Capabilities version="1.1.1">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>Basic test service</Title>
    <Abstract>Fixture for negotiator tests</Abstract>
  </Service>
  <Capability>
    <Request>
      <GetMap>
        <Format>image/png</Format>
        <Format>image/jpeg</Format>
      </GetMap>
    </Request>
    <Layer>
      <Title>Root</Title>
      <BoundingBox SRS="EPSG:4326" minx="-180" miny="-90" maxx="180" maxy="90"/>
      <Layer>
        <Name>base</Name>
        <Title>Base map</Title>
        <BoundingBox SRS="EPSG:3857" minx="-20037508.34" miny="-20037508.34" maxx="20037508.34" maxy="20037508.34"/>
        <Style><Name>default</Name></Style>
      </Layer>
      <Layer>
        <Name>roads</Name>
        <Title>Roads</Title>
        <Style><Name>default</Name></Style>
        <Style><Name>night</Name></Style>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    /// WMS 1.1.1 document with a DOCTYPE internal subset, modelled on a
    /// public OpenStreetMap WMS.
    pub const WMS_111: &str = r#"<?xml version="1.0"?>
<!DOCTYPE WMT_MS_Capabilities SYSTEM "http://schemas.opengis.net/wms/1.1.1/WMS_MS_Capabilities.dtd"
 [
 <!ELEMENT VendorSpecificCapabilities EMPTY>
 ]>  <!-- end of DOCTYPE declaration -->
<WMT_MS_Capabilities version="1.1.1">
<Service>
  <Name>OGC:WMS</Name>
  <Title>OpenStreetMap WMS</Title>
  <Abstract>OpenStreetMap WMS for tests</Abstract>
  <OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:href="http://osm.example.org"/>
  <ContactInformation>
    <ContactPersonPrimary>
      <ContactPerson>Jane Doe</ContactPerson>
    </ContactPersonPrimary>
    <ContactAddress>
      <City>Bonn</City>
      <StateOrProvince></StateOrProvince>
    </ContactAddress>
  </ContactInformation>
  <Fees>None</Fees>
</Service>
<Capability>
  <Request>
    <GetCapabilities>
      <Format>application/vnd.ogc.wms_xml</Format>
    </GetCapabilities>
    <GetMap>
      <Format>image/jpeg</Format>
      <Format>image/png</Format>
      <DCPType>
        <HTTP>
          <Get><OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:href="http://osm.example.org/service?"/></Get>
        </HTTP>
      </DCPType>
    </GetMap>
    <GetFeatureInfo>
      <Format>text/plain</Format>
    </GetFeatureInfo>
  </Request>
  <Exception>
    <Format>application/vnd.ogc.se_xml</Format>
  </Exception>
  <Layer queryable="1">
    <Title>OpenStreetMap WMS</Title>
    <SRS>EPSG:900913</SRS>
    <SRS>EPSG:3857</SRS>
    <SRS>EPSG:4326</SRS>
    <LatLonBoundingBox minx="-180" miny="-88" maxx="180" maxy="88" />
    <BoundingBox SRS="EPSG:900913" minx="-20037508.3428" miny="-25819498.5135" maxx="20037508.3428" maxy="25819498.5135" />
    <BoundingBox SRS="EPSG:4326" minx="-180" miny="-88" maxx="180" maxy="88" />
    <BoundingBox SRS="EPSG:3857" minx="-20037508.3428" miny="-25819498.5135" maxx="20037508.3428" maxy="25819498.5135" />
    <Layer queryable="1">
      <Name>OSM-WMS</Name>
      <Title>OpenStreetMap WMS</Title>
      <LatLonBoundingBox minx="-180" miny="-88" maxx="180" maxy="88" />
      <BoundingBox SRS="EPSG:900913" minx="-20037508.3428" miny="-25819498.5135" maxx="20037508.3428" maxy="25819498.5135" />
      <BoundingBox SRS="EPSG:4326" minx="-180" miny="-88" maxx="180" maxy="88" />
      <BoundingBox SRS="EPSG:3857" minx="-20037508.3428" miny="-25819498.5135" maxx="20037508.3428" maxy="25819498.5135" />
      <Style>
        <Name>default</Name>
        <Title>default</Title>
        <LegendURL width="155" height="344">
          <Format>image/png</Format>
          <OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:type="simple" xlink:href="http://osm.example.org/service?layer=OSM-WMS&amp;request=GetLegendGraphic"/>
        </LegendURL>
      </Style>
    </Layer>
    <Layer queryable="1">
      <Name>OSM-Overlay-WMS</Name>
      <Title>OSM Overlay WMS</Title>
      <BoundingBox SRS="EPSG:4326" minx="-180" miny="-88" maxx="180" maxy="88" />
    </Layer>
    <Layer>
      <Name>SRTM30-Hillshade</Name>
      <Title>SRTM30 Hillshade</Title>
      <LatLonBoundingBox minx="-180" miny="-56" maxx="180" maxy="60" />
      <BoundingBox SRS="EPSG:4326" minx="-180" miny="-56" maxx="180" maxy="60" />
    </Layer>
  </Layer>
</Capability>
</WMT_MS_Capabilities>"#;

    /// WMS 1.3.0 document with a default namespace and a nested group.
    pub const WMS_130: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">
<Service>
  <Name>WMS Server</Name>
  <Title>Test WMS 1.3.0</Title>
  <Abstract>Test WMS service using version 1.3.0 format</Abstract>
  <OnlineResource xlink:href="http://example.com/wms"/>
</Service>
<Capability>
  <Request>
    <GetCapabilities>
      <Format>text/xml</Format>
    </GetCapabilities>
    <GetMap>
      <Format>image/png</Format>
      <Format>image/jpeg</Format>
    </GetMap>
  </Request>
  <Exception>
    <Format>XML</Format>
  </Exception>
  <Layer>
    <Title>Test WMS 1.3.0</Title>
    <CRS>EPSG:4326</CRS>
    <CRS>EPSG:3857</CRS>
    <EX_GeographicBoundingBox>
      <westBoundLongitude>-180</westBoundLongitude>
      <eastBoundLongitude>180</eastBoundLongitude>
      <southBoundLatitude>-90</southBoundLatitude>
      <northBoundLatitude>90</northBoundLatitude>
    </EX_GeographicBoundingBox>
    <BoundingBox CRS="EPSG:4326" minx="-90" miny="-180" maxx="90" maxy="180"/>
    <BoundingBox CRS="EPSG:3857" minx="-20037508.34" miny="-20037508.34" maxx="20037508.34" maxy="20037508.34"/>
    <Layer queryable="1">
      <Name>test_layer</Name>
      <Title>Test Layer</Title>
      <BoundingBox CRS="EPSG:4326" minx="-90" miny="-180" maxx="90" maxy="180"/>
      <Style>
        <Name>default</Name>
        <Title>Default Style</Title>
      </Style>
    </Layer>
    <Layer>
      <Title>Group</Title>
      <Layer>
        <Name>nested_layer</Name>
        <Title>Nested Layer</Title>
      </Layer>
    </Layer>
  </Layer>
</Capability>
</WMS_Capabilities>"#;

    /// Well-formed 1.1.1 document that advertises only a non-EPSG box.
    pub const NO_EPSG: &str = r#"<?xml version="1.0"?>
<WMT_MS_Capabilities version="1.1.1">
  <Service><Name>OGC:WMS</Name><Title>Local grid only</Title></Service>
  <Capability>
    <Request><GetMap><Format>image/png</Format></GetMap></Request>
    <Layer>
      <Title>Root</Title>
      <BoundingBox SRS="CUSTOM:1" minx="1" miny="1" maxx="2" maxy="2"/>
      <Layer><Name>grid</Name><Title>Grid</Title></Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    /// Well-formed 1.1.1 document without any GetMap format.
    pub const NO_FORMATS: &str = r#"<?xml version="1.0"?>
<WMT_MS_Capabilities version="1.1.1">
  <Service><Name>OGC:WMS</Name><Title>No formats</Title></Service>
  <Capability>
    <Layer>
      <Title>Root</Title>
      <BoundingBox SRS="EPSG:4326" minx="-180" miny="-90" maxx="180" maxy="90"/>
      <Layer><Name>base</Name></Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    /// Well-formed XML that is neither capability schema.
    pub const SERVICE_EXCEPTION: &str = r#"<?xml version="1.0"?>
<ServiceExceptionReport version="1.1.1">
  <ServiceException code="InvalidFormat">Unknown format</ServiceException>
</ServiceExceptionReport>"#;
}
