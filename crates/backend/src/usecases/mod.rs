pub mod u508_order_sales_upload;
