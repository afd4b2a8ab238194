//! Northwind-like fixture shared by the integration tests.

#![allow(dead_code)]

use odata_lib::ProtocolVersion;
use odata_lib::Session;
use odata_lib::Settings;
use odata_lib::metadata::EntityType;
use odata_lib::metadata::Schema;
use odata_lib::model::ODataEntity;

pub const SERVICE_URL: &str = "https://services.example.com/odata";

pub fn northwind() -> Schema {
    Schema::new("NorthwindModel")
        .entity_type(
            EntityType::new("Category")
                .key(["CategoryID"])
                .typed_property("CategoryID", "Edm.Int32")
                .property("CategoryName")
                .collection("Products", "Product"),
        )
        .entity_type(
            EntityType::new("Product")
                .key(["ProductID"])
                .typed_property("ProductID", "Edm.Int32")
                .property("ProductName")
                .typed_property("UnitPrice", "Edm.Decimal")
                .typed_property("Discontinued", "Edm.Boolean")
                .typed_property("CategoryID", "Edm.Int32")
                .reference("Category", "Category")
                .collection("Order_Details", "Order_Detail"),
        )
        .entity_type(
            EntityType::new("Order_Detail")
                .key(["OrderID", "ProductID"])
                .typed_property("OrderID", "Edm.Int32")
                .typed_property("ProductID", "Edm.Int32")
                .typed_property("Quantity", "Edm.Int16")
                .typed_property("UnitPrice", "Edm.Decimal")
                .reference("Order", "Order")
                .reference("Product", "Product"),
        )
        .entity_type(
            EntityType::new("Order")
                .key(["OrderID"])
                .typed_property("OrderID", "Edm.Int32")
                .typed_property("OrderDate", "Edm.DateTimeOffset")
                .property("CustomerID")
                .typed_property("EmployeeID", "Edm.Int32")
                .property("ShipName")
                .reference("Customer", "Customer")
                .reference("Employee", "Employee")
                .collection("Order_Details", "Order_Detail"),
        )
        .entity_type(
            EntityType::new("Customer")
                .key(["CustomerID"])
                .property("CustomerID")
                .property("CompanyName")
                .property("City")
                .collection("Orders", "Order"),
        )
        .entity_type(
            EntityType::new("Employee")
                .key(["EmployeeID"])
                .typed_property("EmployeeID", "Edm.Int32")
                .property("FirstName")
                .property("LastName")
                .collection("Orders", "Order")
                .collection("Subordinates", "Employee")
                .reference("Manager", "Employee"),
        )
        .entity_type(
            EntityType::new("Transport")
                .key(["TransportID"])
                .typed_property("TransportID", "Edm.Int32")
                .property("Name"),
        )
        .entity_type(EntityType::new("Ship").base("Transport").property("ShipName"))
        .entity_type(EntityType::new("Truck").base("Transport").property("TruckNumber"))
        .entity_type(
            EntityType::new("Account")
                .key(["AccountId"])
                .typed_property("AccountId", "Edm.Guid")
                .property("Name")
                .typed_property("Revenue", "Edm.Decimal")
                .typed_property("CreatedOn", "Edm.DateTimeOffset"),
        )
        .entity_set("Categories", "Category")
        .entity_set("Products", "Product")
        .entity_set("Order_Details", "Order_Detail")
        .entity_set("Orders", "Order")
        .entity_set("Customers", "Customer")
        .entity_set("Employees", "Employee")
        .entity_set("Transport", "Transport")
        .entity_set("Accounts", "Account")
        .function("GetProductsByRating")
        .bound_function("MostExpensive")
        .action("ResetDataSource")
        .bound_action("Discount")
}

/// A V4 session with the fixture already loaded.
pub fn session() -> Session {
    session_with(Settings::default())
}

/// A V3 session with the fixture already loaded.
pub fn session_v3() -> Session {
    session_with(Settings::default().with_protocol(ProtocolVersion::V3))
}

pub fn session_with(settings: Settings) -> Session {
    Session::builder()
        .url(SERVICE_URL)
        .schema(northwind())
        .settings(settings)
        .build()
        .unwrap()
}

pub struct Product;

impl ODataEntity for Product {
    const TYPE_NAME: &'static str = "Product";
}

pub struct Employee;

impl ODataEntity for Employee {
    const TYPE_NAME: &'static str = "Employee";
}

pub struct Order;

impl ODataEntity for Order {
    const TYPE_NAME: &'static str = "Order";
}

pub struct Ship;

impl ODataEntity for Ship {
    const TYPE_NAME: &'static str = "Ship";
}
